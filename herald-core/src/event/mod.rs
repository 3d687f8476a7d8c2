//! Server-pushed events as a closed sum type.
//!
//! Frames arriving on the event channel carry a wire name and a JSON
//! payload. They are decoded exactly once, at the transport boundary, into
//! [`ServerEvent`]; everything downstream matches on [`EventBody`] instead
//! of comparing strings. Names that do not belong to [`EventKind`] never
//! decode and are therefore never dispatched.

mod kind;
mod payload;

pub use kind::EventKind;
pub use payload::{
    CommissionEarned, ConnectionErrorEvent, ConnectionStatus, DocumentProcessed, QuestionSetGenerated,
    QuizCompleted, SubscriptionUpdated, SystemAnnouncement, ValidationAssigned,
    ValidationCompleted,
};

use serde::de::DeserializeOwned;

use crate::data::Notification;
use crate::error::DataError;
use crate::types::Timestamp;

/// Payload of a decoded event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    /// A persisted notification row pushed by the server.
    Notification(Notification),
    /// An expert was assigned a validation.
    ValidationAssigned(ValidationAssigned),
    /// A validation finished.
    ValidationCompleted(ValidationCompleted),
    /// A quiz attempt was graded.
    QuizCompleted(QuizCompleted),
    /// An uploaded document finished processing.
    DocumentProcessed(DocumentProcessed),
    /// A question set finished generating.
    QuestionSetGenerated(QuestionSetGenerated),
    /// A commission was credited.
    CommissionEarned(CommissionEarned),
    /// The user's subscription changed.
    SubscriptionUpdated(SubscriptionUpdated),
    /// Broadcast announcement.
    SystemAnnouncement(SystemAnnouncement),
    /// Local: connectivity changed.
    ConnectionStatus(ConnectionStatus),
    /// Local: reconnection gave up.
    ConnectionError(ConnectionErrorEvent),
}

impl EventBody {
    /// Returns the kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Notification(_) => EventKind::Notification,
            Self::ValidationAssigned(_) => EventKind::ValidationAssigned,
            Self::ValidationCompleted(_) => EventKind::ValidationCompleted,
            Self::QuizCompleted(_) => EventKind::QuizCompleted,
            Self::DocumentProcessed(_) => EventKind::DocumentProcessed,
            Self::QuestionSetGenerated(_) => EventKind::QuestionSetGenerated,
            Self::CommissionEarned(_) => EventKind::CommissionEarned,
            Self::SubscriptionUpdated(_) => EventKind::SubscriptionUpdated,
            Self::SystemAnnouncement(_) => EventKind::SystemAnnouncement,
            Self::ConnectionStatus(_) => EventKind::ConnectionStatus,
            Self::ConnectionError(_) => EventKind::ConnectionError,
        }
    }
}

/// A decoded event with the time the server stamped on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEvent {
    /// Decoded payload.
    pub body: EventBody,
    /// Envelope timestamp, or receive time when the envelope had none.
    pub timestamp: Timestamp,
}

impl ServerEvent {
    /// Creates an event stamped now.
    #[must_use]
    pub fn new(body: EventBody) -> Self {
        Self {
            body,
            timestamp: Timestamp::now(),
        }
    }

    /// Sets the event timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.body.kind()
    }

    /// Creates a `connection.status` event.
    #[must_use]
    pub fn connection_status(connected: bool, reason: Option<String>) -> Self {
        Self::new(EventBody::ConnectionStatus(ConnectionStatus { connected, reason }))
    }

    /// Creates a `connection.error` event.
    #[must_use]
    pub fn connection_error(reason: impl Into<String>, attempts: u32) -> Self {
        Self::new(EventBody::ConnectionError(ConnectionErrorEvent {
            reason: reason.into(),
            attempts,
        }))
    }

    /// Decodes a wire event.
    ///
    /// Returns `Ok(None)` for names that are not server-pushed domain
    /// events, including the local `connection.*` names.
    ///
    /// # Errors
    ///
    /// Returns `DataError::ParseFailed` if the payload does not match the
    /// shape expected for a known name.
    pub fn decode(
        name: &str,
        data: serde_json::Value,
        timestamp: Option<Timestamp>,
    ) -> Result<Option<Self>, DataError> {
        let Some(kind) = EventKind::from_wire_name(name) else {
            return Ok(None);
        };

        let body = match kind {
            EventKind::Notification => EventBody::Notification(parse(name, data)?),
            EventKind::ValidationAssigned => EventBody::ValidationAssigned(parse(name, data)?),
            EventKind::ValidationCompleted => EventBody::ValidationCompleted(parse(name, data)?),
            EventKind::QuizCompleted => EventBody::QuizCompleted(parse(name, data)?),
            EventKind::DocumentProcessed => EventBody::DocumentProcessed(parse(name, data)?),
            EventKind::QuestionSetGenerated => {
                EventBody::QuestionSetGenerated(parse(name, data)?)
            }
            EventKind::CommissionEarned => EventBody::CommissionEarned(parse(name, data)?),
            EventKind::SubscriptionUpdated => EventBody::SubscriptionUpdated(parse(name, data)?),
            EventKind::SystemAnnouncement => EventBody::SystemAnnouncement(parse(name, data)?),
            EventKind::ConnectionStatus | EventKind::ConnectionError => return Ok(None),
        };

        Ok(Some(Self {
            body,
            timestamp: timestamp.unwrap_or_else(Timestamp::now),
        }))
    }
}

fn parse<T: DeserializeOwned>(name: &str, data: serde_json::Value) -> Result<T, DataError> {
    serde_json::from_value(data).map_err(|e| DataError::ParseFailed {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_question_set_generated() {
        let event = ServerEvent::decode(
            "questionSet.generated",
            json!({"questionId": "q1", "title": "Algebra"}),
            None,
        )
        .unwrap()
        .unwrap();

        assert_eq!(event.kind(), EventKind::QuestionSetGenerated);
        match event.body {
            EventBody::QuestionSetGenerated(p) => {
                assert_eq!(p.question_id, "q1");
                assert_eq!(p.title.as_deref(), Some("Algebra"));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_decode_keeps_envelope_timestamp() {
        let ts = Timestamp::from_millis(1_704_067_200_000);
        let event = ServerEvent::decode(
            "system.announcement",
            json!({"title": "Maintenance", "message": "Tonight 22:00"}),
            Some(ts),
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.timestamp, ts);
    }

    #[test]
    fn test_unknown_name_is_not_decoded() {
        let decoded = ServerEvent::decode("leaderboard.updated", json!({}), None).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_local_names_are_not_decoded_from_wire() {
        let decoded =
            ServerEvent::decode("connection.status", json!({"connected": true}), None).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let result = ServerEvent::decode("quiz.completed", json!({"score": 3}), None);
        assert!(matches!(result, Err(DataError::ParseFailed { .. })));
    }

    #[test]
    fn test_decode_notification_row() {
        let event = ServerEvent::decode(
            "notification",
            json!({
                "id": "srv-1",
                "title": "Welcome",
                "message": "Hello",
                "type": "info",
                "isRead": false,
                "createdAt": "2024-01-01T00:00:00Z"
            }),
            None,
        )
        .unwrap()
        .unwrap();

        match event.body {
            EventBody::Notification(n) => {
                assert_eq!(n.id.as_str(), "srv-1");
                assert!(!n.provisional);
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
