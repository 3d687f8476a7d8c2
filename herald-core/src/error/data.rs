//! Decoding errors for wire frames and payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an inbound frame or payload cannot be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataError {
    /// A known event or field failed to parse.
    #[error("[Data] Parse failed for field '{field}': {reason}")]
    ParseFailed {
        /// Event name or field that failed to parse.
        field: String,
        /// Reason for the parse failure.
        reason: String,
    },

    /// Frame is not a valid JSON envelope.
    #[error("[Data] JSON error: {reason}")]
    JsonError {
        /// Reason for the JSON error.
        reason: String,
    },
}

impl DataError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        super::ErrorSeverity::Warning
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError {
            reason: err.to_string(),
        }
    }
}
