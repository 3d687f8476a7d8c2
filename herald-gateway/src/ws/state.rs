//! Connection state management.

use herald_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the event channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected, no loop running.
    #[default]
    Disconnected,
    /// First open in progress.
    Connecting,
    /// Channel open.
    Connected,
    /// Waiting to retry after a failure or loss.
    Reconnecting,
    /// Gave up after the attempt limit.
    Failed,
}

impl ConnectionState {
    /// Returns true if the channel is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true while a connection loop is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connected | Self::Connecting | Self::Reconnecting)
    }

    /// Returns true if the channel is in a transitional state.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Mutable bookkeeping shared between the manager and its loop task.
#[derive(Debug, Default)]
pub(crate) struct InternalState {
    pub state: ConnectionState,
    /// Consecutive failed opens or losses since the last successful open.
    pub attempt_count: u32,
    pub last_connected: Option<Timestamp>,
    pub last_heartbeat_at: Option<Timestamp>,
    pub last_ping: Option<Timestamp>,
    pub awaiting_pong: bool,
    pub last_error: Option<String>,
}

impl InternalState {
    pub fn mark_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
        self.attempt_count = 0;
        self.awaiting_pong = false;
        self.last_error = None;
    }

    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempt_count = 0;
        self.last_connected = Some(Timestamp::now());
        self.awaiting_pong = false;
    }

    /// Records a failure and returns the new attempt count.
    pub fn mark_reconnecting(&mut self, error: impl Into<String>) -> u32 {
        self.state = ConnectionState::Reconnecting;
        self.attempt_count += 1;
        self.awaiting_pong = false;
        self.last_error = Some(error.into());
        self.attempt_count
    }

    pub fn mark_failed(&mut self) {
        self.state = ConnectionState::Failed;
        self.awaiting_pong = false;
    }

    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.awaiting_pong = false;
    }

    pub fn record_ping(&mut self) {
        self.last_ping = Some(Timestamp::now());
        self.awaiting_pong = true;
    }

    pub fn record_pong(&mut self) {
        self.last_heartbeat_at = Some(Timestamp::now());
        self.awaiting_pong = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(ConnectionState::Reconnecting.to_string(), "Reconnecting");
        assert_eq!(ConnectionState::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_is_active() {
        assert!(ConnectionState::Connected.is_active());
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Reconnecting.is_active());
        assert!(!ConnectionState::Disconnected.is_active());
        assert!(!ConnectionState::Failed.is_active());
    }

    #[test]
    fn test_reconnect_counts_and_connect_resets() {
        let mut state = InternalState::default();
        state.mark_connecting();
        assert_eq!(state.mark_reconnecting("refused"), 1);
        assert_eq!(state.mark_reconnecting("refused"), 2);
        assert_eq!(state.state, ConnectionState::Reconnecting);
        assert_eq!(state.last_error.as_deref(), Some("refused"));

        state.mark_connected();
        assert_eq!(state.attempt_count, 0);
        assert!(state.state.is_connected());
    }

    #[test]
    fn test_ping_pong() {
        let mut state = InternalState::default();
        state.record_ping();
        assert!(state.awaiting_pong);
        assert!(state.last_heartbeat_at.is_none());

        state.record_pong();
        assert!(!state.awaiting_pong);
        assert!(state.last_heartbeat_at.is_some());
    }
}
