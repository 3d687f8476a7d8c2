//! Event names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every event name the client understands.
///
/// The nine domain kinds arrive from the server; `ConnectionStatus` and
/// `ConnectionError` are emitted locally by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `notification`
    #[serde(rename = "notification")]
    Notification,
    /// `validation.assigned`
    #[serde(rename = "validation.assigned")]
    ValidationAssigned,
    /// `validation.completed`
    #[serde(rename = "validation.completed")]
    ValidationCompleted,
    /// `quiz.completed`
    #[serde(rename = "quiz.completed")]
    QuizCompleted,
    /// `document.processed`
    #[serde(rename = "document.processed")]
    DocumentProcessed,
    /// `questionSet.generated`
    #[serde(rename = "questionSet.generated")]
    QuestionSetGenerated,
    /// `commission.earned`
    #[serde(rename = "commission.earned")]
    CommissionEarned,
    /// `subscription.updated`
    #[serde(rename = "subscription.updated")]
    SubscriptionUpdated,
    /// `system.announcement`
    #[serde(rename = "system.announcement")]
    SystemAnnouncement,
    /// `connection.status`
    #[serde(rename = "connection.status")]
    ConnectionStatus,
    /// `connection.error`
    #[serde(rename = "connection.error")]
    ConnectionError,
}

impl EventKind {
    /// Server-pushed kinds that produce notifications.
    pub const DOMAIN: [Self; 9] = [
        Self::Notification,
        Self::ValidationAssigned,
        Self::ValidationCompleted,
        Self::QuizCompleted,
        Self::DocumentProcessed,
        Self::QuestionSetGenerated,
        Self::CommissionEarned,
        Self::SubscriptionUpdated,
        Self::SystemAnnouncement,
    ];

    /// Locally emitted connectivity kinds.
    pub const CONNECTION: [Self; 2] = [Self::ConnectionStatus, Self::ConnectionError];

    /// Returns the wire name.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::ValidationAssigned => "validation.assigned",
            Self::ValidationCompleted => "validation.completed",
            Self::QuizCompleted => "quiz.completed",
            Self::DocumentProcessed => "document.processed",
            Self::QuestionSetGenerated => "questionSet.generated",
            Self::CommissionEarned => "commission.earned",
            Self::SubscriptionUpdated => "subscription.updated",
            Self::SystemAnnouncement => "system.announcement",
            Self::ConnectionStatus => "connection.status",
            Self::ConnectionError => "connection.error",
        }
    }

    /// Looks a kind up by wire name.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::DOMAIN
            .iter()
            .chain(Self::CONNECTION.iter())
            .copied()
            .find(|kind| kind.wire_name() == name)
    }

    /// Returns true for server-pushed domain kinds.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        !matches!(self, Self::ConnectionStatus | Self::ConnectionError)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for kind in EventKind::DOMAIN.iter().chain(EventKind::CONNECTION.iter()) {
            assert_eq!(EventKind::from_wire_name(kind.wire_name()), Some(*kind));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(EventKind::from_wire_name("quiz.started"), None);
        assert_eq!(EventKind::from_wire_name(""), None);
    }

    #[test]
    fn test_domain_classification() {
        assert!(EventKind::CommissionEarned.is_domain());
        assert!(!EventKind::ConnectionStatus.is_domain());
        assert_eq!(EventKind::DOMAIN.len(), 9);
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&EventKind::QuestionSetGenerated).unwrap();
        assert_eq!(json, "\"questionSet.generated\"");
    }
}
