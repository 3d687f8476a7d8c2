//! Event consumer errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by an event consumer. The dispatcher logs it and moves
/// on to the next consumer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumerError {
    /// Consumer failed while handling an event.
    #[error("[Consumer] {consumer} failed: {reason}")]
    Failed {
        /// Consumer name.
        consumer: String,
        /// Failure reason.
        reason: String,
    },

    /// Consumer panicked.
    #[error("[Consumer] {consumer} panicked: {message}")]
    Panicked {
        /// Consumer name.
        consumer: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// Consumer's downstream channel is closed or full.
    #[error("[Consumer] {consumer} channel unavailable")]
    ChannelClosed {
        /// Consumer name.
        consumer: String,
    },
}

impl ConsumerError {
    /// Creates a failure error.
    #[must_use]
    pub fn failed(consumer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            consumer: consumer.into(),
            reason: reason.into(),
        }
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        super::ErrorSeverity::Warning
    }
}
