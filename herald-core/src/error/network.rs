//! Transport errors.
//!
//! Everything in here is raised below the connection manager and, apart
//! from DNS and TLS failures, feeds the reconnection policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network error type covering connection failures, timeouts, DNS
/// resolution, TLS, WebSocket and HTTP errors.
///
/// # Examples
///
/// ```
/// use herald_core::error::NetworkError;
///
/// let error = NetworkError::ConnectionFailed {
///     reason: "Connection refused".to_string(),
/// };
/// assert!(error.is_recoverable());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkError {
    /// Connection to remote host failed.
    #[error("[Network] Connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for the connection failure.
        reason: String,
    },

    /// Connection timed out.
    #[error("[Network] Connection timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// DNS resolution failed.
    #[error("[Network] DNS resolution failed for {host}")]
    DnsResolution {
        /// Host that failed to resolve.
        host: String,
    },

    /// TLS/SSL error occurred.
    #[error("[Network] TLS error: {reason}")]
    Tls {
        /// Reason for the TLS error.
        reason: String,
    },

    /// WebSocket error occurred.
    #[error("[Network] WebSocket error: {reason}")]
    WebSocket {
        /// Reason for the WebSocket error.
        reason: String,
    },

    /// HTTP request failed.
    #[error("[Network] HTTP error: status {status_code} - {reason}")]
    Http {
        /// HTTP status code.
        status_code: u16,
        /// Reason for the HTTP error.
        reason: String,
    },

    /// Connection was closed unexpectedly.
    #[error("[Network] Connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the connection closure.
        reason: String,
    },
}

impl NetworkError {
    /// Returns true if this error is recoverable (can be retried).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::DnsResolution { .. } | Self::Tls { .. } => ErrorSeverity::Fatal,
            Self::Timeout { .. }
            | Self::ConnectionFailed { .. }
            | Self::ConnectionClosed { .. }
            | Self::WebSocket { .. } => ErrorSeverity::Recoverable,
            Self::Http { status_code, .. } if *status_code >= 500 => ErrorSeverity::Recoverable,
            Self::Http { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns true if the server rejected the credential.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Http { status_code: 401 | 403, .. })
    }
}
