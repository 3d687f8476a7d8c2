//! `NewType` wrappers for notification primitives.
//!
//! - [`NotificationId`] - server-assigned or client-minted notification ids
//! - [`Timestamp`] - UTC instants accepted as ISO-8601 strings or epoch millis

mod notification_id;
mod timestamp;

pub use notification_id::NotificationId;
pub use timestamp::Timestamp;

use serde::{Deserialize, Deserializer};

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Notification ID is empty
    #[error("notification ID cannot be empty")]
    EmptyNotificationId,

    /// Timestamp could not be parsed
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Accepts an entity id as a string or a number. Blank ids are rejected.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    let id = match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    };
    if id.trim().is_empty() {
        return Err(serde::de::Error::custom("entity id must not be empty"));
    }
    Ok(id)
}
