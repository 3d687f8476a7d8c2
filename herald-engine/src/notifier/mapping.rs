//! Turns pushed domain events into notifications.

use herald_core::data::{EntityKind, Notification, NotificationType};
use herald_core::event::{EventBody, ServerEvent};

/// Builds the notification a domain event stands for.
///
/// `notification` pushes carry the server row and keep its id. Every other
/// domain push gets a provisional id and the event timestamp as its
/// creation time. Connection events return `None`.
#[must_use]
pub fn to_notification(event: &ServerEvent) -> Option<Notification> {
    let notification = match &event.body {
        EventBody::Notification(row) => return Some(row.clone()),

        EventBody::ValidationAssigned(p) => Notification::provisional(
            or(&p.title, "New validation assigned"),
            or(&p.message, "A validation is waiting for your review"),
            NotificationType::Info,
        )
        .with_related(EntityKind::Validation, &p.validation_id),

        EventBody::ValidationCompleted(p) => {
            let approved = p.approved.unwrap_or(true);
            let (kind, title, message) = if approved {
                (NotificationType::Success, "Validation approved", "Your content was approved")
            } else {
                (NotificationType::Warning, "Validation rejected", "Your content needs changes")
            };
            Notification::provisional(or(&p.title, title), or(&p.message, message), kind)
                .with_related(EntityKind::Validation, &p.validation_id)
        }

        EventBody::QuizCompleted(p) => {
            let subject = p.title.as_deref().unwrap_or("your quiz");
            let message = match p.score {
                Some(score) => format!("You scored {score} on {subject}"),
                None => format!("Results for {subject} are ready"),
            };
            Notification::provisional("Quiz completed", message, NotificationType::Success)
                .with_related(EntityKind::Quiz, &p.quiz_id)
        }

        EventBody::DocumentProcessed(p) => {
            let subject = p.title.as_deref().unwrap_or("Your document");
            let notification = if p.succeeded() {
                Notification::provisional(
                    "Document processed",
                    format!("{subject} is ready"),
                    NotificationType::Success,
                )
            } else {
                let reason = p.error.as_deref().unwrap_or("unknown error");
                Notification::provisional(
                    "Document processing failed",
                    format!("{subject} could not be processed: {reason}"),
                    NotificationType::Error,
                )
            };
            notification.with_related(EntityKind::Document, &p.document_id)
        }

        EventBody::QuestionSetGenerated(p) => {
            let message = match &p.title {
                Some(title) => format!("{title} is ready to use"),
                None => "Your question set is ready to use".to_string(),
            };
            Notification::provisional("Question set generated", message, NotificationType::Success)
                .with_related(EntityKind::QuestionSet, &p.question_id)
        }

        EventBody::CommissionEarned(p) => {
            let message = match (p.amount, p.currency.as_deref()) {
                (Some(amount), Some(currency)) => format!("You earned {amount:.2} {currency}"),
                (Some(amount), None) => format!("You earned {amount:.2}"),
                _ => "A commission was credited to your account".to_string(),
            };
            Notification::provisional("Commission earned", message, NotificationType::Success)
                .with_related(EntityKind::Commission, &p.commission_id)
        }

        EventBody::SubscriptionUpdated(p) => {
            let message = match (p.plan.as_deref(), p.status.as_deref()) {
                (Some(plan), Some(status)) => format!("{plan} plan is now {status}"),
                (Some(plan), None) => format!("You are now on the {plan} plan"),
                (None, Some(status)) => format!("Your subscription is now {status}"),
                (None, None) => "Your subscription changed".to_string(),
            };
            Notification::provisional("Subscription updated", message, NotificationType::Info)
                .with_related(EntityKind::Subscription, &p.subscription_id)
        }

        EventBody::SystemAnnouncement(p) => {
            let kind = p
                .level
                .as_deref()
                .and_then(|level| level.parse().ok())
                .unwrap_or(NotificationType::Info);
            Notification::provisional(
                or(&p.title, "Announcement"),
                p.message.clone().unwrap_or_default(),
                kind,
            )
        }

        EventBody::ConnectionStatus(_) | EventBody::ConnectionError(_) => return None,
    };

    Some(notification.with_created_at(event.timestamp))
}

fn or(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::types::Timestamp;
    use serde_json::json;

    fn decode(name: &str, data: serde_json::Value) -> ServerEvent {
        ServerEvent::decode(name, data, Some(Timestamp::from_millis(1_700_000_000_000)))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_question_set_generated() {
        let event = decode("questionSet.generated", json!({"questionId": "q1", "title": "Algebra"}));
        let n = to_notification(&event).unwrap();

        assert!(!n.is_read);
        assert!(n.provisional);
        assert_eq!(n.notification_type, NotificationType::Success);
        assert_eq!(n.related_entity_type(), Some(EntityKind::QuestionSet));
        assert_eq!(n.related_entity_id(), Some("q1"));
        assert!(n.message.contains("Algebra"));
        assert_eq!(n.created_at, event.timestamp);
    }

    #[test]
    fn test_validation_completed_rejection_is_warning() {
        let approved = decode("validation.completed", json!({"validationId": "v1", "approved": true}));
        let rejected = decode("validation.completed", json!({"validationId": "v1", "approved": false}));

        assert_eq!(
            to_notification(&approved).unwrap().notification_type,
            NotificationType::Success
        );
        let n = to_notification(&rejected).unwrap();
        assert_eq!(n.notification_type, NotificationType::Warning);
        assert_eq!(n.related_entity_id(), Some("v1"));
    }

    #[test]
    fn test_document_failure_is_error() {
        let event = decode(
            "document.processed",
            json!({"documentId": 7, "title": "Thesis.pdf", "error": "corrupt"}),
        );
        let n = to_notification(&event).unwrap();
        assert_eq!(n.notification_type, NotificationType::Error);
        assert!(n.message.contains("corrupt"));
        assert_eq!(n.related_entity_id(), Some("7"));
    }

    #[test]
    fn test_announcement_level_and_no_link() {
        let event = decode(
            "system.announcement",
            json!({"title": "Maintenance", "message": "Tonight", "level": "warning"}),
        );
        let n = to_notification(&event).unwrap();
        assert_eq!(n.notification_type, NotificationType::Warning);
        assert!(n.related.is_none());

        let unknown = decode("system.announcement", json!({"level": "shout"}));
        assert_eq!(to_notification(&unknown).unwrap().notification_type, NotificationType::Info);
    }

    #[test]
    fn test_notification_row_keeps_server_id() {
        let event = decode(
            "notification",
            json!({"id": "srv-9", "title": "Hi", "message": "There", "type": "success", "isRead": true}),
        );
        let n = to_notification(&event).unwrap();
        assert_eq!(n.id.as_str(), "srv-9");
        assert!(!n.provisional);
        assert!(n.is_read);
    }

    #[test]
    fn test_commission_message() {
        let event = decode(
            "commission.earned",
            json!({"commissionId": "c1", "amount": 12.5, "currency": "EUR"}),
        );
        let n = to_notification(&event).unwrap();
        assert_eq!(n.message, "You earned 12.50 EUR");
        assert_eq!(n.related_entity_type(), Some(EntityKind::Commission));
    }

    #[test]
    fn test_connection_events_are_not_notifications() {
        assert!(to_notification(&ServerEvent::connection_status(true, None)).is_none());
        assert!(to_notification(&ServerEvent::connection_error("gone", 20)).is_none());
    }
}
