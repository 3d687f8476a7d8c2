//! Configuration errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading, overriding or validating configuration.
///
/// # Examples
///
/// ```
/// use herald_core::error::ConfigError;
///
/// let error = ConfigError::missing_field_in_section("url", "connection");
/// assert!(error.to_string().contains("connection"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// Required configuration field is missing.
    #[error("[Config] Missing field '{field}'{}", section.as_ref().map(|s| format!(" in section '{s}'")).unwrap_or_default())]
    MissingField {
        /// Name of the missing field.
        field: String,
        /// Optional section where the field should be.
        section: Option<String>,
    },

    /// Configuration value is invalid.
    #[error("[Config] Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field with the invalid value.
        field: String,
        /// Reason why the value is invalid.
        reason: String,
    },

    /// Configuration file could not be read.
    #[error("[Config] Failed to read file '{path}': {reason}")]
    FileReadError {
        /// Path to the configuration file.
        path: String,
        /// Reason for the read failure.
        reason: String,
    },

    /// Configuration file could not be written.
    #[error("[Config] Failed to write file '{path}': {reason}")]
    FileWriteError {
        /// Path to the configuration file.
        path: String,
        /// Reason for the write failure.
        reason: String,
    },

    /// Configuration file format is invalid.
    #[error("[Config] Invalid format in '{path}': {reason}")]
    InvalidFormat {
        /// Path to the configuration file.
        path: String,
        /// Reason for the format error.
        reason: String,
    },

    /// Environment variable has an invalid value.
    #[error("[Config] Invalid environment variable '{name}': {reason}")]
    InvalidEnvVar {
        /// Name of the environment variable.
        name: String,
        /// Reason why the value is invalid.
        reason: String,
    },

    /// Configuration validation failed.
    #[error("[Config] Validation failed: {reason}")]
    ValidationFailed {
        /// Reason for the validation failure.
        reason: String,
    },
}

impl ConfigError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::MissingField { .. } | Self::InvalidFormat { .. } => ErrorSeverity::Fatal,
            Self::InvalidValue { .. }
            | Self::FileReadError { .. }
            | Self::FileWriteError { .. }
            | Self::InvalidEnvVar { .. }
            | Self::ValidationFailed { .. } => ErrorSeverity::Warning,
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            section: None,
        }
    }

    /// Creates a missing field error with section.
    #[must_use]
    pub fn missing_field_in_section(field: impl Into<String>, section: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            section: Some(section.into()),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid environment variable error.
    #[must_use]
    pub fn invalid_env(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
