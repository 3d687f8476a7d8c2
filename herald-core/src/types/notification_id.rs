//! Notification identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Prefix carried by every client-minted identifier.
const LOCAL_PREFIX: &str = "local-";

/// Notification ID - either assigned by the server or minted locally for a
/// pushed record the server has not confirmed yet.
///
/// # Examples
///
/// ```
/// use herald_core::types::NotificationId;
///
/// let id = NotificationId::new("n1").unwrap();
/// assert_eq!(id.as_str(), "n1");
/// assert!(!id.is_client_minted());
///
/// let minted = NotificationId::mint();
/// assert!(minted.is_client_minted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Creates a new `NotificationId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyNotificationId` if the string is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyNotificationId);
        }
        Ok(Self(s))
    }

    /// Creates a new `NotificationId` without validation.
    #[must_use]
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a client-side identifier (`local-<uuid v4>`).
    #[must_use]
    pub fn mint() -> Self {
        Self(format!("{LOCAL_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Returns true if this id was minted locally rather than by the server.
    #[must_use]
    pub fn is_client_minted(&self) -> bool {
        self.0.starts_with(LOCAL_PREFIX)
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NotificationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NotificationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NotificationId> for String {
    fn from(id: NotificationId) -> Self {
        id.0
    }
}
