//! Connection manager: one logical event channel with bounded
//! reconnection and heartbeats.

use herald_core::error::{ConnectionError, NetworkError};
use herald_core::event::ServerEvent;
use herald_core::types::Timestamp;
use herald_telemetry::masking::Sensitive;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::ConnectionConfig;
use super::message::{Decoded, Frame, MessageCodec};
use super::state::{ConnectionState, InternalState};
use crate::dispatch::EventDispatcher;
use crate::transport::{Transport, TransportSession};

/// Owns the event channel for one session.
///
/// Decoded server events and local connection events are delivered
/// through the shared [`EventDispatcher`]. Every state change emits a
/// `connection.status` event and is published on [`Self::subscribe_state`].
///
/// # Example
///
/// ```ignore
/// let dispatcher = Arc::new(EventDispatcher::new());
/// let transport = transport::from_config(&config)?;
/// let manager = ConnectionManager::new(config, transport, dispatcher);
/// manager.connect(&token)?;
/// ```
pub struct ConnectionManager {
    shared: Arc<Shared>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

struct Shared {
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
    dispatcher: Arc<EventDispatcher>,
    state: RwLock<InternalState>,
    state_tx: watch::Sender<ConnectionState>,
}

enum PumpExit {
    Cancelled,
    Lost(String),
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    #[must_use]
    pub fn new(
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                transport,
                dispatcher,
                state: RwLock::new(InternalState::default()),
                state_tx,
            }),
            task: Mutex::new(None),
        }
    }

    /// Starts the connection loop.
    ///
    /// A no-op while connected, connecting or reconnecting. From
    /// `Disconnected` or `Failed` a fresh loop starts with the attempt
    /// counter at zero. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::NoCredential` for an empty credential;
    /// no transport attempt is made.
    pub fn connect(&self, credential: &str) -> Result<(), ConnectionError> {
        if credential.trim().is_empty() {
            return Err(ConnectionError::NoCredential);
        }

        {
            let mut state = self.shared.state.write();
            if state.state.is_active() {
                debug!(state = %state.state, "Connect ignored, loop already running");
                return Ok(());
            }
            state.mark_connecting();
        }
        self.shared.publish(ConnectionState::Connecting, None);

        let credential = Sensitive::new(credential.to_string());
        debug!(
            credential = %credential.preview(),
            transport = self.shared.transport.name(),
            "Starting connection loop"
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.shared),
            credential,
            cancel.clone(),
        ));
        if let Some((previous, _)) = self.task.lock().replace((cancel, handle)) {
            previous.cancel();
        }
        Ok(())
    }

    /// Stops the loop, moves to `Disconnected` and clears every dispatcher
    /// registration. Idempotent.
    pub async fn disconnect(&self) {
        let task = self.task.lock().take();
        if let Some((cancel, handle)) = task {
            cancel.cancel();
            if let Err(e) = handle.await
                && e.is_panic()
            {
                error!(error = %e, "Connection loop panicked");
            }
        }

        self.shared.transition(Some("client disconnect".to_string()), |s| {
            s.mark_disconnected();
        });
        self.shared.dispatcher.clear();
        info!("Event channel disconnected");
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.read().state
    }

    /// Watch channel of state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Consecutive failures since the last successful open.
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.shared.state.read().attempt_count
    }

    /// Time of the last acknowledged heartbeat.
    #[must_use]
    pub fn last_heartbeat_at(&self) -> Option<Timestamp> {
        self.shared.state.read().last_heartbeat_at
    }

    /// Last transport error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared.state.read().last_error.clone()
    }

    /// The dispatcher events are delivered through.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.shared.dispatcher
    }

    /// Connection configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some((cancel, _)) = self.task.get_mut().take() {
            cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.shared.config.endpoint())
            .field("state", &self.state())
            .field("attempt_count", &self.attempt_count())
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Applies `update` and, if the state changed, publishes it.
    fn transition(&self, reason: Option<String>, update: impl FnOnce(&mut InternalState)) {
        let (before, after) = {
            let mut state = self.state.write();
            let before = state.state;
            update(&mut state);
            (before, state.state)
        };
        if before != after {
            self.publish(after, reason);
        }
    }

    fn publish(&self, state: ConnectionState, reason: Option<String>) {
        self.state_tx.send_replace(state);
        debug!(state = %state, reason = reason.as_deref().unwrap_or(""), "Connection state changed");
        self.dispatcher.dispatch(&ServerEvent::connection_status(
            state.is_connected(),
            reason,
        ));
    }

    fn handle_frame(&self, codec: &MessageCodec, frame: &Frame) {
        match codec.decode(frame) {
            Ok(Some(Decoded::Event(event))) => {
                self.dispatcher.dispatch(&event);
            }
            Ok(Some(Decoded::Ignored { event })) => {
                debug!(event = %event, "Ignoring unknown event");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Dropping malformed frame"),
        }
    }

    async fn pump(&self, mut session: TransportSession, cancel: &CancellationToken) -> PumpExit {
        let codec = MessageCodec::new();
        let period = self.config.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = session.outbound.try_send(Frame::close(1000, "client disconnect"));
                    return PumpExit::Cancelled;
                }

                inbound = session.inbound.recv() => match inbound {
                    Some(Ok(Frame::Pong(_))) => {
                        self.state.write().record_pong();
                        debug!("Heartbeat acknowledged");
                    }
                    Some(Ok(Frame::Ping(data))) => {
                        let _ = session.outbound.try_send(Frame::Pong(data));
                    }
                    Some(Ok(Frame::Close(reason))) => {
                        let reason = reason.map_or_else(
                            || "closed by server".to_string(),
                            |r| format!("closed by server: {} {}", r.code, r.reason),
                        );
                        return PumpExit::Lost(reason);
                    }
                    Some(Ok(frame)) => self.handle_frame(&codec, &frame),
                    Some(Err(e)) => return PumpExit::Lost(e.to_string()),
                    None => return PumpExit::Lost("transport closed".to_string()),
                },

                _ = heartbeat.tick() => {
                    let overdue = {
                        let mut state = self.state.write();
                        let overdue = state.awaiting_pong;
                        state.record_ping();
                        overdue
                    };
                    if overdue {
                        warn!(interval = ?period, "Previous heartbeat was not acknowledged");
                    }
                    if session.outbound.try_send(Frame::Ping(Vec::new())).is_err() {
                        warn!("Failed to queue heartbeat");
                    }
                }
            }
        }
    }
}

async fn run_loop(shared: Arc<Shared>, credential: Sensitive<String>, cancel: CancellationToken) {
    let config = &shared.config;
    loop {
        let opened = tokio::select! {
            () = cancel.cancelled() => return,
            opened = timeout(config.connect_timeout, shared.transport.open(credential.expose())) => opened,
        };
        let opened = opened.unwrap_or_else(|_| {
            Err(NetworkError::Timeout {
                timeout_ms: u64::try_from(config.connect_timeout.as_millis()).unwrap_or(u64::MAX),
            })
        });

        let reason = match opened {
            Ok(session) => {
                info!(via = session.via, endpoint = %config.endpoint(), "Event channel connected");
                shared.transition(None, InternalState::mark_connected);
                match shared.pump(session, &cancel).await {
                    PumpExit::Cancelled => return,
                    PumpExit::Lost(reason) => {
                        warn!(reason = %reason, "Event channel lost");
                        reason
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to open event channel");
                e.to_string()
            }
        };

        let (attempt, was_reconnecting) = {
            let mut state = shared.state.write();
            let was_reconnecting = state.state == ConnectionState::Reconnecting;
            let attempt = state.mark_reconnecting(reason.clone());
            if attempt >= config.max_reconnect_attempts {
                state.mark_failed();
            }
            (attempt, was_reconnecting)
        };

        if attempt >= config.max_reconnect_attempts {
            error!(attempts = attempt, reason = %reason, "Giving up on event channel");
            shared.publish(ConnectionState::Failed, Some(reason.clone()));
            let exhausted = ConnectionError::MaxReconnectExceeded { attempts: attempt };
            shared
                .dispatcher
                .dispatch(&ServerEvent::connection_error(exhausted.to_string(), attempt));
            return;
        }

        if !was_reconnecting {
            shared.publish(ConnectionState::Reconnecting, Some(reason));
        }
        let delay = config.reconnect_delay_for(attempt);
        info!(
            attempt = attempt,
            max_attempts = config.max_reconnect_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Reconnecting"
        );

        tokio::select! {
            () = cancel.cancelled() => return,
            () = sleep(delay) => {}
        }
    }
}
