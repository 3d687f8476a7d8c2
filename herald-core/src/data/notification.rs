//! Notification record and its wire representation.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{NotificationId, Timestamp, lenient_id};

/// Presentation category of a notification. Carries no other meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    /// Neutral information.
    #[default]
    Info,
    /// Something completed successfully.
    Success,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
}

impl NotificationType {
    /// Returns the wire name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

/// Kind of domain entity a notification links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// A validation assignment.
    Validation,
    /// A quiz.
    Quiz,
    /// An uploaded document.
    Document,
    /// A generated question set.
    QuestionSet,
    /// An expert commission.
    Commission,
    /// A subscription.
    Subscription,
}

impl EntityKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Quiz => "quiz",
            Self::Document => "document",
            Self::QuestionSet => "questionSet",
            Self::Commission => "commission",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(Self::Validation),
            "quiz" => Ok(Self::Quiz),
            "document" => Ok(Self::Document),
            "questionSet" | "question_set" => Ok(Self::QuestionSet),
            "commission" => Ok(Self::Commission),
            "subscription" => Ok(Self::Subscription),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// Deep-link target. Type and id always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelatedEntity {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity identifier.
    pub id: String,
}

impl RelatedEntity {
    /// Creates a related entity reference.
    #[must_use]
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// One user-facing notification.
///
/// The serialized form is the flat `NotificationRecord` used by the REST
/// API and by `notification` push events. `provisional` is local state and
/// is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NotificationRecord", into = "NotificationRecord")]
pub struct Notification {
    /// Server-assigned or client-minted id.
    pub id: NotificationId,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Presentation category.
    pub notification_type: NotificationType,
    /// Whether the user has seen it.
    pub is_read: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Optional deep-link target.
    pub related: Option<RelatedEntity>,
    /// True for pushed records not yet confirmed by an authoritative fetch.
    pub provisional: bool,
}

impl Notification {
    /// Creates an unread, server-confirmed notification.
    #[must_use]
    pub fn new(
        id: NotificationId,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            message: message.into(),
            notification_type,
            is_read: false,
            created_at: Timestamp::now(),
            related: None,
            provisional: false,
        }
    }

    /// Creates an unread notification with a freshly minted provisional id.
    #[must_use]
    pub fn provisional(
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            provisional: true,
            ..Self::new(NotificationId::mint(), title, message, notification_type)
        }
    }

    /// Sets the deep-link target.
    #[must_use]
    pub fn with_related(mut self, kind: EntityKind, id: impl Into<String>) -> Self {
        self.related = Some(RelatedEntity::new(kind, id));
        self
    }

    /// Sets the creation time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets the read flag.
    #[must_use]
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    /// Returns the related entity kind, if any.
    #[must_use]
    pub fn related_entity_type(&self) -> Option<EntityKind> {
        self.related.as_ref().map(|r| r.kind)
    }

    /// Returns the related entity id, if any.
    #[must_use]
    pub fn related_entity_id(&self) -> Option<&str> {
        self.related.as_ref().map(|r| r.id.as_str())
    }
}

/// Flat wire shape of a notification.
///
/// Unknown `type` values fall back to `info`; a record carrying only one
/// of `relatedEntityType`/`relatedEntityId`, or an unknown entity kind,
/// decodes with no related entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Identifier.
    #[serde(alias = "_id", deserialize_with = "record_id")]
    pub id: NotificationId,
    /// Headline.
    #[serde(default)]
    pub title: String,
    /// Body.
    #[serde(default)]
    pub message: String,
    /// Presentation category name.
    #[serde(rename = "type", default)]
    pub notification_type: Option<String>,
    /// Read flag.
    #[serde(default)]
    pub is_read: bool,
    /// Creation time.
    #[serde(default = "Timestamp::now")]
    pub created_at: Timestamp,
    /// Related entity kind name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<String>,
    /// Related entity id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
}

fn record_id<'de, D>(deserializer: D) -> Result<NotificationId, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_id(deserializer).map(NotificationId::new_unchecked)
}

impl From<NotificationRecord> for Notification {
    fn from(record: NotificationRecord) -> Self {
        let notification_type = record
            .notification_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();

        let related = match (record.related_entity_type, record.related_entity_id) {
            (Some(kind), Some(id)) if !id.is_empty() => kind
                .parse::<EntityKind>()
                .ok()
                .map(|kind| RelatedEntity { kind, id }),
            _ => None,
        };

        Self {
            provisional: record.id.is_client_minted(),
            id: record.id,
            title: record.title,
            message: record.message,
            notification_type,
            is_read: record.is_read,
            created_at: record.created_at,
            related,
        }
    }
}

impl From<Notification> for NotificationRecord {
    fn from(n: Notification) -> Self {
        let (related_entity_type, related_entity_id) = match n.related {
            Some(RelatedEntity { kind, id }) => (Some(kind.as_str().to_string()), Some(id)),
            None => (None, None),
        };

        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            notification_type: Some(n.notification_type.as_str().to_string()),
            is_read: n.is_read,
            created_at: n.created_at,
            related_entity_type,
            related_entity_id,
        }
    }
}
