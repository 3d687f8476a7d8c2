//! Per-event payload shapes.
//!
//! Field names follow the camelCase the server emits. Only the entity ids
//! are required; entity ids may arrive as strings or numbers.

use serde::{Deserialize, Serialize};

use crate::types::lenient_id;

/// `validation.assigned`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationAssigned {
    /// Validation id.
    #[serde(deserialize_with = "lenient_id")]
    pub validation_id: String,
    /// Optional title.
    #[serde(default)]
    pub title: Option<String>,
    /// Optional message.
    #[serde(default)]
    pub message: Option<String>,
}

/// `validation.completed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationCompleted {
    /// Validation id.
    #[serde(deserialize_with = "lenient_id")]
    pub validation_id: String,
    /// Whether the expert approved.
    #[serde(default)]
    pub approved: Option<bool>,
    /// Optional title.
    #[serde(default)]
    pub title: Option<String>,
    /// Optional message.
    #[serde(default)]
    pub message: Option<String>,
}

/// `quiz.completed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCompleted {
    /// Quiz id.
    #[serde(deserialize_with = "lenient_id")]
    pub quiz_id: String,
    /// Optional quiz title.
    #[serde(default)]
    pub title: Option<String>,
    /// Score, when graded.
    #[serde(default)]
    pub score: Option<f64>,
}

/// `document.processed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProcessed {
    /// Document id.
    #[serde(deserialize_with = "lenient_id")]
    pub document_id: String,
    /// Optional document title.
    #[serde(default)]
    pub title: Option<String>,
    /// Processing outcome; absent means success.
    #[serde(default)]
    pub success: Option<bool>,
    /// Failure reason.
    #[serde(default)]
    pub error: Option<String>,
}

impl DocumentProcessed {
    /// Returns true unless the server reported a failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success.unwrap_or(self.error.is_none())
    }
}

/// `questionSet.generated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetGenerated {
    /// Question set id.
    #[serde(deserialize_with = "lenient_id")]
    pub question_id: String,
    /// Optional title.
    #[serde(default)]
    pub title: Option<String>,
}

/// `commission.earned`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionEarned {
    /// Commission id.
    #[serde(deserialize_with = "lenient_id")]
    pub commission_id: String,
    /// Credited amount.
    #[serde(default)]
    pub amount: Option<f64>,
    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// `subscription.updated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdated {
    /// Subscription id.
    #[serde(deserialize_with = "lenient_id")]
    pub subscription_id: String,
    /// Plan name.
    #[serde(default)]
    pub plan: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<String>,
}

/// `system.announcement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAnnouncement {
    /// Headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Body.
    #[serde(default)]
    pub message: Option<String>,
    /// Severity level (`info`, `success`, `warning`, `error`).
    #[serde(default)]
    pub level: Option<String>,
}

/// `connection.status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Whether the channel is open.
    pub connected: bool,
    /// Transition reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `connection.error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionErrorEvent {
    /// Last failure observed.
    pub reason: String,
    /// Attempts made before giving up.
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_id_is_accepted() {
        let p: QuizCompleted = serde_json::from_value(json!({"quizId": 42, "score": 8.5})).unwrap();
        assert_eq!(p.quiz_id, "42");
        assert_eq!(p.score, Some(8.5));
        assert!(p.title.is_none());
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let r: Result<ValidationAssigned, _> =
            serde_json::from_value(json!({"validationId": "  "}));
        assert!(r.is_err());
    }

    #[test]
    fn test_document_outcome() {
        let ok: DocumentProcessed = serde_json::from_value(json!({"documentId": "d1"})).unwrap();
        assert!(ok.succeeded());

        let failed: DocumentProcessed =
            serde_json::from_value(json!({"documentId": "d1", "error": "corrupt pdf"})).unwrap();
        assert!(!failed.succeeded());

        let explicit: DocumentProcessed =
            serde_json::from_value(json!({"documentId": "d1", "success": false})).unwrap();
        assert!(!explicit.succeeded());
    }

    #[test]
    fn test_announcement_all_optional() {
        let p: SystemAnnouncement = serde_json::from_value(json!({})).unwrap();
        assert!(p.title.is_none() && p.level.is_none());
    }
}
