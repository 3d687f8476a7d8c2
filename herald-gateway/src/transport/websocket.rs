//! WebSocket transport.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use herald_core::error::NetworkError;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::{RemoteEnd, Transport, TransportSession};
use crate::ws::{CloseReason, Frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens sessions over a WebSocket with `Authorization: Bearer` on the
/// upgrade request.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    endpoint: String,
    channel_capacity: usize,
}

impl WebSocketTransport {
    /// Creates a transport for `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, channel_capacity: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel_capacity,
        }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, credential: &str) -> Result<TransportSession, NetworkError> {
        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(map_ws_error)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {credential}")).map_err(|_| {
            NetworkError::ConnectionFailed {
                reason: "credential is not a valid header value".to_string(),
            }
        })?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (stream, response) = connect_async(request).await.map_err(map_ws_error)?;
        info!(
            endpoint = %self.endpoint,
            status = response.status().as_u16(),
            "WebSocket opened"
        );

        let (session, remote) = TransportSession::channel(self.name(), self.channel_capacity);
        tokio::spawn(run_pump(stream, remote));
        Ok(session)
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

async fn run_pump(stream: WsStream, remote: RemoteEnd) {
    let (mut sink, mut source) = stream.split();
    let RemoteEnd {
        inbound,
        mut outbound,
    } = remote;

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                let Some(frame) = outgoing else {
                    debug!("Session released, closing WebSocket");
                    let _ = sink.close().await;
                    break;
                };
                if let Err(e) = sink.send(to_message(frame)).await {
                    let _ = inbound.send(Err(map_ws_error(e))).await;
                    break;
                }
            }

            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            warn!(error = %e, "Failed to answer ping");
                        }
                    }
                    Some(Ok(message)) => {
                        let Some(frame) = from_message(message) else {
                            continue;
                        };
                        let closing = frame.is_close();
                        if inbound.send(Ok(frame)).await.is_err() || closing {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        let _ = inbound.send(Err(map_ws_error(e))).await;
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(s) => Message::Text(s),
        Frame::Binary(b) => Message::Binary(b),
        Frame::Ping(b) => Message::Ping(b),
        Frame::Pong(b) => Message::Pong(b),
        Frame::Close(reason) => Message::Close(reason.map(|r| CloseFrame {
            code: CloseCode::from(r.code),
            reason: r.reason.into(),
        })),
    }
}

fn from_message(message: Message) -> Option<Frame> {
    match message {
        Message::Text(s) => Some(Frame::Text(s)),
        Message::Binary(b) => Some(Frame::Binary(b)),
        Message::Ping(b) => Some(Frame::Ping(b)),
        Message::Pong(b) => Some(Frame::Pong(b)),
        Message::Close(frame) => Some(Frame::Close(frame.map(|f| CloseReason {
            code: f.code.into(),
            reason: f.reason.to_string(),
        }))),
        Message::Frame(_) => None,
    }
}

fn map_ws_error(error: WsError) -> NetworkError {
    match error {
        WsError::Http(response) => {
            let status = response.status();
            NetworkError::Http {
                status_code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("upgrade rejected").to_string(),
            }
        }
        WsError::Tls(e) => NetworkError::Tls {
            reason: e.to_string(),
        },
        WsError::ConnectionClosed | WsError::AlreadyClosed => NetworkError::ConnectionClosed {
            reason: error.to_string(),
        },
        WsError::Io(e) => NetworkError::ConnectionFailed {
            reason: e.to_string(),
        },
        WsError::Url(e) => NetworkError::ConnectionFailed {
            reason: e.to_string(),
        },
        other => NetworkError::WebSocket {
            reason: other.to_string(),
        },
    }
}
