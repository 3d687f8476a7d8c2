//! Frames and the JSON envelope codec.

use herald_core::error::DataError;
use herald_core::event::ServerEvent;
use herald_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Transport-neutral frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Heartbeat probe.
    Ping(Vec<u8>),
    /// Heartbeat acknowledgment.
    Pong(Vec<u8>),
    /// Close frame.
    Close(Option<CloseReason>),
}

/// Close frame reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReason {
    /// Close code.
    pub code: u16,
    /// Close reason text.
    pub reason: String,
}

impl Frame {
    /// Creates a text frame.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Creates a close frame.
    #[must_use]
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Self::Close(Some(CloseReason {
            code,
            reason: reason.into(),
        }))
    }

    /// Returns true if this is a pong frame.
    #[must_use]
    pub fn is_pong(&self) -> bool {
        matches!(self, Self::Pong(_))
    }

    /// Returns true if this is a close frame.
    #[must_use]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Returns the text content if this is a text frame.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Wire envelope: `{"event": name, "data": payload, "timestamp": iso}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Server timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl Envelope {
    /// Creates an envelope without a timestamp.
    #[must_use]
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
            timestamp: None,
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Serializes the envelope into a text frame.
    ///
    /// # Errors
    ///
    /// Returns `DataError::JsonError` if serialization fails.
    pub fn to_frame(&self) -> Result<Frame, DataError> {
        Ok(Frame::Text(serde_json::to_string(self)?))
    }
}

/// Result of decoding one data frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A known event.
    Event(ServerEvent),
    /// A well-formed envelope whose name is not a known event.
    Ignored {
        /// Wire name that was skipped.
        event: String,
    },
}

/// Decodes data frames into [`ServerEvent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Creates a new message codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decodes a text or binary frame.
    ///
    /// Control frames decode to `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the frame is not a JSON envelope or the
    /// payload of a known event is malformed.
    pub fn decode(&self, frame: &Frame) -> Result<Option<Decoded>, DataError> {
        let envelope: Envelope = match frame {
            Frame::Text(text) => serde_json::from_str(text)?,
            Frame::Binary(data) => serde_json::from_slice(data)?,
            Frame::Ping(_) | Frame::Pong(_) | Frame::Close(_) => return Ok(None),
        };
        self.decode_envelope(envelope).map(Some)
    }

    /// Decodes an already parsed envelope.
    ///
    /// # Errors
    ///
    /// Returns `DataError::ParseFailed` if the payload of a known event is
    /// malformed.
    pub fn decode_envelope(&self, envelope: Envelope) -> Result<Decoded, DataError> {
        let Envelope {
            event,
            data,
            timestamp,
        } = envelope;
        Ok(match ServerEvent::decode(&event, data, timestamp)? {
            Some(decoded) => Decoded::Event(decoded),
            None => Decoded::Ignored { event },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::event::{EventBody, EventKind};
    use serde_json::json;

    #[test]
    fn test_decode_known_event() {
        let frame = Frame::text(
            r#"{"event":"quiz.completed","data":{"quizId":42,"score":87.5},"timestamp":"2024-03-01T10:00:00Z"}"#,
        );
        let decoded = MessageCodec::new().decode(&frame).unwrap().unwrap();
        let Decoded::Event(event) = decoded else {
            panic!("expected event");
        };
        assert_eq!(event.kind(), EventKind::QuizCompleted);
        assert_eq!(event.timestamp.to_rfc3339(), "2024-03-01T10:00:00.000Z");
        match event.body {
            EventBody::QuizCompleted(p) => {
                assert_eq!(p.quiz_id, "42");
                assert_eq!(p.score, Some(87.5));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name_is_ignored() {
        let frame = Frame::text(r#"{"event":"leaderboard.updated","data":{}}"#);
        let decoded = MessageCodec::new().decode(&frame).unwrap().unwrap();
        assert_eq!(
            decoded,
            Decoded::Ignored {
                event: "leaderboard.updated".to_string()
            }
        );
    }

    #[test]
    fn test_local_names_are_not_accepted_from_the_wire() {
        let frame = Frame::text(r#"{"event":"connection.status","data":{"connected":true}}"#);
        let decoded = MessageCodec::new().decode(&frame).unwrap().unwrap();
        assert!(matches!(decoded, Decoded::Ignored { .. }));
    }

    #[test]
    fn test_malformed_frames() {
        let codec = MessageCodec::new();
        assert!(codec.decode(&Frame::text("not json")).is_err());

        let missing_id = Frame::text(r#"{"event":"validation.assigned","data":{"title":"x"}}"#);
        assert!(matches!(
            codec.decode(&missing_id),
            Err(DataError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_control_frames_decode_to_none() {
        let codec = MessageCodec::new();
        assert!(codec.decode(&Frame::Pong(vec![])).unwrap().is_none());
        assert!(codec.decode(&Frame::close(1000, "bye")).unwrap().is_none());
    }

    #[test]
    fn test_envelope_to_frame() {
        let frame = Envelope::new("system.announcement", json!({"title": "Hi"}))
            .to_frame()
            .unwrap();
        let text = frame.as_text().unwrap();
        assert!(text.contains("\"event\":\"system.announcement\""));
        assert!(!text.contains("timestamp"));
    }
}
