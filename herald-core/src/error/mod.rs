//! Error types and handling framework.
//!
//! Every fallible operation in the client returns one of the category
//! enums below. `HeraldError` unions them for callers that do not care
//! which layer failed.
//!
//! - `ConnectionError` - connect/reconnect lifecycle
//! - `NetworkError` - transport failures, drive reconnection
//! - `ApiError` - REST collaborator failures
//! - `ConsumerError` - isolated by the dispatcher
//! - `DataError` - frame and payload decoding
//! - `ConfigError` - configuration
//!
//! ```
//! use herald_core::error::{HeraldError, NetworkError};
//!
//! let error = HeraldError::from(NetworkError::Timeout { timeout_ms: 5000 });
//! assert_eq!(error.category(), "network");
//! assert!(error.is_recoverable());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Define ErrorSeverity first so submodules can use it
/// Error severity levels for categorizing errors.
///
/// Severity levels help determine the appropriate response to an error:
/// - `Fatal`: Unrecoverable errors that require immediate attention
/// - `Recoverable`: Errors that can be retried or recovered from
/// - `Warning`: Non-critical issues that should be logged
/// - `Info`: Informational messages about expected conditions
///
/// # Examples
///
/// ```
/// use herald_core::error::ErrorSeverity;
///
/// let severity = ErrorSeverity::Recoverable;
/// assert!(severity.is_recoverable());
/// assert!(!severity.is_fatal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Unrecoverable error requiring immediate attention.
    /// The system cannot continue normal operation.
    Fatal,

    /// Error that can potentially be recovered from through retry or fallback.
    /// The operation failed but the system can continue.
    #[default]
    Recoverable,

    /// Non-critical issue that should be logged but doesn't prevent operation.
    /// May indicate degraded functionality.
    Warning,

    /// Informational message about an expected or handled condition.
    /// Not a true error, but worth noting.
    Info,
}

impl ErrorSeverity {
    /// Returns true if this error is recoverable (not fatal).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Returns true if this error is fatal (unrecoverable).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns true if this is a warning level severity.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::Warning)
    }

    /// Returns true if this is an info level severity.
    #[must_use]
    pub const fn is_info(&self) -> bool {
        matches!(self, Self::Info)
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

mod api;
mod config;
mod connection;
mod consumer;
mod data;
mod network;

pub use api::ApiError;
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use consumer::ConsumerError;
pub use data::DataError;
pub use network::NetworkError;

/// Top-level error type for the Herald client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeraldError {
    /// Connection lifecycle error.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Network-related error.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// REST API error.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Event consumer error.
    #[error("{0}")]
    Consumer(#[from] ConsumerError),

    /// Decoding error.
    #[error("{0}")]
    Data(#[from] DataError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl HeraldError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Network(e) => e.severity(),
            Self::Api(e) => e.severity(),
            Self::Consumer(e) => e.severity(),
            Self::Data(e) => e.severity(),
            Self::Config(e) => e.severity(),
        }
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }

    /// Returns the error category as a string.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Network(_) => "network",
            Self::Api(_) => "api",
            Self::Consumer(_) => "consumer",
            Self::Data(_) => "data",
            Self::Config(_) => "config",
        }
    }

    /// Returns the inner API error, if this is an API error.
    #[must_use]
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the inner connection error, if this is a connection error.
    #[must_use]
    pub fn as_connection_error(&self) -> Option<&ConnectionError> {
        match self {
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized Result type for Herald operations.
pub type Result<T> = std::result::Result<T, HeraldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity_display() {
        assert_eq!(ErrorSeverity::Fatal.to_string(), "FATAL");
        assert_eq!(ErrorSeverity::Recoverable.to_string(), "RECOVERABLE");
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARNING");
        assert_eq!(ErrorSeverity::Info.to_string(), "INFO");
    }

    #[test]
    fn test_error_severity_is_recoverable() {
        assert!(!ErrorSeverity::Fatal.is_recoverable());
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(ErrorSeverity::Warning.is_recoverable());
        assert!(ErrorSeverity::Info.is_recoverable());
    }

    #[test]
    fn test_categories() {
        let cases: Vec<(HeraldError, &str)> = vec![
            (ConnectionError::NoCredential.into(), "connection"),
            (NetworkError::Timeout { timeout_ms: 1 }.into(), "network"),
            (ApiError::fetch_failed("boom").into(), "api"),
            (ConsumerError::failed("toast", "boom").into(), "consumer"),
            (ConfigError::missing_field("url").into(), "config"),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category);
        }
    }

    #[test]
    fn test_no_credential_is_fatal() {
        let err = HeraldError::from(ConnectionError::NoCredential);
        assert!(!err.is_recoverable());
        assert_eq!(err.as_connection_error(), Some(&ConnectionError::NoCredential));
        assert!(err.as_api_error().is_none());
    }

    #[test]
    fn test_display_keeps_category_prefix() {
        let err = HeraldError::from(ApiError::fetch_failed("connection reset"));
        assert!(format!("{err}").starts_with("[Api]"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let err = HeraldError::Connection(ConnectionError::MaxReconnectExceeded { attempts: 20 });
        let json = serde_json::to_string(&err).unwrap();
        let parsed: HeraldError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, parsed);
    }
}
