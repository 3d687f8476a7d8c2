//! HTTP long-poll transport.
//!
//! Each poll is `GET {url}?wait=<secs>[&cursor=<c>]` with bearer auth and
//! answers `{"events": [<envelope>...], "cursor": "<c>"}`. Envelopes are
//! re-framed as text frames so the manager decodes them exactly like
//! WebSocket traffic. The channel is receive-only: a ping from the manager
//! is answered with a pong once the next poll succeeds.

use async_trait::async_trait;
use herald_core::error::NetworkError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{RemoteEnd, Transport, TransportSession};
use crate::ws::{Envelope, Frame};

/// Slack added on top of the server hold time before a poll times out.
const REQUEST_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Deserialize)]
struct PollBatch {
    #[serde(default)]
    events: Vec<Envelope>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Clone)]
struct PollRequest {
    url: String,
    credential: String,
    cursor: Option<String>,
    wait: Duration,
}

/// Opens receive-only sessions over HTTP long-polling.
#[derive(Debug, Clone)]
pub struct LongPollTransport {
    client: Client,
    url: String,
    poll_timeout: Duration,
    channel_capacity: usize,
}

impl LongPollTransport {
    /// Creates a transport polling `url`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        poll_timeout: Duration,
        channel_capacity: usize,
    ) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_MARGIN)
            .build()
            .map_err(|e| NetworkError::ConnectionFailed {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: url.into(),
            poll_timeout,
            channel_capacity,
        })
    }
}

#[async_trait]
impl Transport for LongPollTransport {
    async fn open(&self, credential: &str) -> Result<TransportSession, NetworkError> {
        let handshake = PollRequest {
            url: self.url.clone(),
            credential: credential.to_string(),
            cursor: None,
            wait: Duration::ZERO,
        };
        let first = poll_once(self.client.clone(), handshake.clone()).await?;
        debug!(url = %self.url, events = first.events.len(), "Long-poll session opened");

        let (session, remote) = TransportSession::channel(self.name(), self.channel_capacity);
        let next = PollRequest {
            wait: self.poll_timeout,
            ..handshake
        };
        tokio::spawn(run_pump(self.client.clone(), next, first, remote));
        Ok(session)
    }

    fn name(&self) -> &'static str {
        "long-poll"
    }
}

async fn run_pump(client: Client, mut request: PollRequest, first: PollBatch, remote: RemoteEnd) {
    let RemoteEnd {
        inbound,
        mut outbound,
    } = remote;

    if !forward(&inbound, &mut request, first).await {
        return;
    }

    let mut pending_pong: Option<Vec<u8>> = None;
    let mut poll = Box::pin(poll_once(client.clone(), request.clone()));

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                None | Some(Frame::Close(_)) => {
                    debug!("Long-poll session released");
                    break;
                }
                Some(Frame::Ping(data)) => pending_pong = Some(data),
                Some(_) => debug!("Long-poll transport is receive-only, frame dropped"),
            },

            result = &mut poll => {
                match result {
                    Ok(batch) => {
                        if !forward(&inbound, &mut request, batch).await {
                            break;
                        }
                        if let Some(data) = pending_pong.take()
                            && inbound.send(Ok(Frame::Pong(data))).await.is_err()
                        {
                            break;
                        }
                        poll = Box::pin(poll_once(client.clone(), request.clone()));
                    }
                    Err(e) => {
                        warn!(error = %e, "Long-poll request failed");
                        let _ = inbound.send(Err(e)).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Forwards a batch and advances the cursor. Returns false once the
/// manager has gone away.
async fn forward(
    inbound: &tokio::sync::mpsc::Sender<Result<Frame, NetworkError>>,
    request: &mut PollRequest,
    batch: PollBatch,
) -> bool {
    if batch.cursor.is_some() {
        request.cursor = batch.cursor;
    }
    for envelope in batch.events {
        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(event = %envelope.event, error = %e, "Dropping unencodable envelope");
                continue;
            }
        };
        if inbound.send(Ok(frame)).await.is_err() {
            return false;
        }
    }
    true
}

async fn poll_once(client: Client, request: PollRequest) -> Result<PollBatch, NetworkError> {
    let mut query = vec![("wait", request.wait.as_secs().to_string())];
    if let Some(cursor) = &request.cursor {
        query.push(("cursor", cursor.clone()));
    }

    let response = client
        .get(&request.url)
        .bearer_auth(&request.credential)
        .query(&query)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    timeout_ms: u64::try_from(request.wait.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                NetworkError::ConnectionFailed {
                    reason: e.to_string(),
                }
            }
        })?;

    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(PollBatch::default());
    }
    if !status.is_success() {
        return Err(NetworkError::Http {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("poll rejected").to_string(),
        });
    }

    response
        .json::<PollBatch>()
        .await
        .map_err(|e| NetworkError::ConnectionFailed {
            reason: format!("Invalid poll response: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttpServer;

    fn transport(server: &MockHttpServer) -> LongPollTransport {
        LongPollTransport::new(
            format!("{}/events/poll", server.base_url),
            Duration::from_secs(25),
            16,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_forwards_events_and_advances_cursor() {
        let server = MockHttpServer::start(vec![
            (200, r#"{"events":[],"cursor":"c1"}"#.to_string()),
            (
                200,
                r#"{"events":[{"event":"quiz.completed","data":{"quizId":"z1"}}],"cursor":"c2"}"#
                    .to_string(),
            ),
        ])
        .await;

        let mut session = transport(&server).open("secret-token").await.unwrap();
        assert_eq!(session.via, "long-poll");

        let frame = session.inbound.recv().await.unwrap().unwrap();
        assert!(frame.as_text().unwrap().contains("quiz.completed"));

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].header("authorization"), Some("Bearer secret-token"));
        assert!(requests[0].target.contains("wait=0"));
        assert!(requests[1].target.contains("wait=25"));
        assert!(requests[1].target.contains("cursor=c1"));
    }

    #[tokio::test]
    async fn test_auth_rejection_on_open() {
        let server =
            MockHttpServer::start(vec![(401, r#"{"message":"Unauthorized"}"#.to_string())]).await;
        let err = transport(&server).open("expired").await.unwrap_err();
        assert!(err.is_auth_rejection());
    }

    #[tokio::test]
    async fn test_ping_answered_after_poll() {
        let server = MockHttpServer::start(vec![
            (200, r#"{"events":[]}"#.to_string()),
            (204, String::new()),
        ])
        .await;

        let mut session = transport(&server).open("token").await.unwrap();
        session.outbound.send(Frame::Ping(vec![7])).await.unwrap();

        let frame = session.inbound.recv().await.unwrap().unwrap();
        assert_eq!(frame, Frame::Pong(vec![7]));
    }

    #[tokio::test]
    async fn test_failed_poll_ends_session() {
        let server = MockHttpServer::start(vec![
            (200, r#"{"events":[]}"#.to_string()),
            (503, String::new()),
        ])
        .await;

        let mut session = transport(&server).open("token").await.unwrap();
        let err = session.inbound.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, NetworkError::Http { status_code: 503, .. }));
        assert!(session.inbound.recv().await.is_none());
    }
}
