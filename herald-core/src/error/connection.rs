//! Connection manager errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NetworkError;

/// Errors surfaced by the connection manager.
///
/// Only `NoCredential` is ever returned to a caller of `connect`; the other
/// variants describe why the connection loop stopped and travel as
/// `connection.error` events.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionError {
    /// `connect` was called without a usable credential.
    #[error("[Connection] No credential supplied")]
    NoCredential,

    /// A transport failure, recoverable by reconnecting.
    #[error("[Connection] Transport error: {0}")]
    Transport(#[from] NetworkError),

    /// Reconnection gave up.
    #[error("[Connection] Gave up after {attempts} reconnect attempts")]
    MaxReconnectExceeded {
        /// Attempts made.
        attempts: u32,
    },
}

impl ConnectionError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::NoCredential | Self::MaxReconnectExceeded { .. } => ErrorSeverity::Fatal,
            Self::Transport(e) => e.severity(),
        }
    }
}
