//! Event channel transports.
//!
//! A [`Transport`] opens one authenticated session and hands back a pair of
//! frame channels. The session's pump task owns the socket or HTTP client;
//! it ends when the remote side goes away (the inbound channel closes) or
//! when the manager drops the outbound sender.

mod long_poll;
mod websocket;

pub use long_poll::LongPollTransport;
pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use herald_core::error::NetworkError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::ws::{ConnectionConfig, Frame};

/// Opens authenticated event sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a session using `credential` as the bearer token.
    async fn open(&self, credential: &str) -> Result<TransportSession, NetworkError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// The manager's side of an open session.
#[derive(Debug)]
pub struct TransportSession {
    /// Frames and transport errors from the server. `None` means the
    /// session ended.
    pub inbound: mpsc::Receiver<Result<Frame, NetworkError>>,
    /// Frames to the server. Dropping it closes the session.
    pub outbound: mpsc::Sender<Frame>,
    /// Name of the transport that opened the session.
    pub via: &'static str,
}

/// The pump's side of an open session.
#[derive(Debug)]
pub struct RemoteEnd {
    /// Delivers frames to the manager.
    pub inbound: mpsc::Sender<Result<Frame, NetworkError>>,
    /// Frames the manager wants sent.
    pub outbound: mpsc::Receiver<Frame>,
}

impl TransportSession {
    /// Creates a connected session/remote pair.
    #[must_use]
    pub fn channel(via: &'static str, capacity: usize) -> (Self, RemoteEnd) {
        let capacity = capacity.max(1);
        let (in_tx, in_rx) = mpsc::channel(capacity);
        let (out_tx, out_rx) = mpsc::channel(capacity);
        (
            Self {
                inbound: in_rx,
                outbound: out_tx,
                via,
            },
            RemoteEnd {
                inbound: in_tx,
                outbound: out_rx,
            },
        )
    }
}

/// Tries `primary` and, unless the credential was rejected, `fallback`.
pub struct FallbackTransport {
    primary: Arc<dyn Transport>,
    fallback: Arc<dyn Transport>,
}

impl FallbackTransport {
    /// Creates a fallback chain.
    #[must_use]
    pub fn new(primary: Arc<dyn Transport>, fallback: Arc<dyn Transport>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Transport for FallbackTransport {
    async fn open(&self, credential: &str) -> Result<TransportSession, NetworkError> {
        match self.primary.open(credential).await {
            Ok(session) => Ok(session),
            Err(e) if e.is_auth_rejection() => Err(e),
            Err(primary_error) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %primary_error,
                    "Primary transport failed, trying fallback"
                );
                self.fallback.open(credential).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

/// Builds the transport stack described by `config`: WebSocket, wrapped in
/// a long-poll fallback when enabled.
///
/// # Errors
///
/// Returns `NetworkError` if the HTTP client for long-polling cannot be
/// built.
pub fn from_config(config: &ConnectionConfig) -> Result<Arc<dyn Transport>, NetworkError> {
    let websocket: Arc<dyn Transport> = Arc::new(WebSocketTransport::new(
        config.endpoint(),
        config.channel_capacity,
    ));
    if !config.long_poll.enabled {
        return Ok(websocket);
    }
    let long_poll: Arc<dyn Transport> = Arc::new(LongPollTransport::new(
        config.poll_endpoint(),
        config.long_poll.poll_timeout,
        config.channel_capacity,
    )?);
    Ok(Arc::new(FallbackTransport::new(websocket, long_poll)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        error: Option<NetworkError>,
        opens: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                error: None,
                opens: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, error: NetworkError) -> Arc<Self> {
            Arc::new(Self {
                name,
                error: Some(error),
                opens: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn open(&self, _credential: &str) -> Result<TransportSession, NetworkError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok(TransportSession::channel(self.name, 4).0),
            }
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Scripted::ok("ws");
        let fallback = Scripted::ok("poll");
        let transport = FallbackTransport::new(primary.clone(), fallback.clone());

        let session = transport.open("token").await.unwrap();
        assert_eq!(session.via, "ws");
        assert_eq!(fallback.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_on_transport_failure() {
        let primary = Scripted::failing(
            "ws",
            NetworkError::ConnectionFailed {
                reason: "refused".to_string(),
            },
        );
        let fallback = Scripted::ok("poll");
        let transport = FallbackTransport::new(primary, fallback.clone());

        let session = transport.open("token").await.unwrap();
        assert_eq!(session.via, "poll");
        assert_eq!(fallback.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_rejection_does_not_fall_back() {
        let primary = Scripted::failing(
            "ws",
            NetworkError::Http {
                status_code: 401,
                reason: "Unauthorized".to_string(),
            },
        );
        let fallback = Scripted::ok("poll");
        let transport = FallbackTransport::new(primary, fallback.clone());

        let err = transport.open("token").await.unwrap_err();
        assert!(err.is_auth_rejection());
        assert_eq!(fallback.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let config = ConnectionConfig::builder()
            .url("ws://localhost:3001")
            .build();
        assert_eq!(from_config(&config).unwrap().name(), "fallback");

        let ws_only = ConnectionConfig::builder()
            .url("ws://localhost:3001")
            .long_poll_enabled(false)
            .build();
        assert_eq!(from_config(&ws_only).unwrap().name(), "websocket");
    }
}
