//! REST collaborator errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NetworkError;

/// Errors from the notification REST API.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    /// Listing notifications failed.
    #[error("[Api] Fetch failed: {reason}")]
    FetchFailed {
        /// Underlying reason.
        reason: String,
    },

    /// A mutating call failed.
    #[error("[Api] {operation} failed: {reason}")]
    MutationFailed {
        /// Operation name (`mark_read`, `mark_all_read`, `delete`).
        operation: String,
        /// Underlying reason.
        reason: String,
    },

    /// Server answered with a non-success status.
    #[error("[Api] HTTP {status_code} from {endpoint}")]
    Status {
        /// Endpoint path.
        endpoint: String,
        /// HTTP status code.
        status_code: u16,
    },

    /// Response body could not be decoded.
    #[error("[Api] Invalid response from {endpoint}: {reason}")]
    InvalidResponse {
        /// Endpoint path.
        endpoint: String,
        /// Decode failure.
        reason: String,
    },

    /// Transport failure.
    #[error("[Api] {0}")]
    Network(#[from] NetworkError),

    /// No access token was available for the call.
    #[error("[Api] Not authenticated")]
    Unauthenticated,

    /// The session ended before the response arrived.
    #[error("[Api] Session ended before the response arrived")]
    SessionEnded,
}

impl ApiError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::Network(e) => e.severity(),
            Self::Status { status_code, .. } if *status_code >= 500 => ErrorSeverity::Recoverable,
            Self::FetchFailed { .. } | Self::MutationFailed { .. } => ErrorSeverity::Recoverable,
            Self::Status { .. } | Self::InvalidResponse { .. } | Self::Unauthenticated => {
                ErrorSeverity::Warning
            }
            Self::SessionEnded => ErrorSeverity::Info,
        }
    }

    /// Wraps any error as a fetch failure.
    #[must_use]
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            reason: reason.into(),
        }
    }
}
