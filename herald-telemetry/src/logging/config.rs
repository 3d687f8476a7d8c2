//! Logging configuration types.

use herald_core::config::{Configurable, EnvOverride, Validatable};
use herald_core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the logging system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive (e.g. "info", "herald_gateway=debug").
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Output targets
    #[serde(default = "default_outputs")]
    pub outputs: Vec<LogOutput>,

    /// Include thread IDs in log output
    #[serde(default)]
    pub include_thread_id: bool,

    /// Include file and line information
    #[serde(default)]
    pub include_file_info: bool,

    /// Include span enter/exit events
    #[serde(default)]
    pub include_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            outputs: default_outputs(),
            include_thread_id: false,
            include_file_info: false,
            include_span_events: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_outputs() -> Vec<LogOutput> {
    vec![LogOutput::Stdout]
}

impl Validatable for LogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::missing_field_in_section("level", "logging"));
        }
        if self.outputs.is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.outputs",
                "at least one output is required",
            ));
        }
        for output in &self.outputs {
            if let LogOutput::File { path, .. } = output
                && path.trim().is_empty()
            {
                return Err(ConfigError::missing_field_in_section("path", "logging.outputs"));
            }
        }
        Ok(())
    }
}

impl Configurable for LogConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        EnvOverride::apply_string(&format!("{prefix}_LOG_LEVEL"), &mut self.level);
        EnvOverride::apply_number(&format!("{prefix}_LOG_FORMAT"), &mut self.format)
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        vec![format!("{prefix}_LOG_LEVEL"), format!("{prefix}_LOG_FORMAT")]
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format for log aggregation systems
    #[default]
    Json,
    /// Human-readable format for development
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Log output target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to file with optional rotation
    File {
        /// Directory path for log files
        path: String,
        /// Rotation configuration
        rotation: Option<RotationConfig>,
    },
}

/// Log rotation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationConfig {
    /// Rotate logs hourly
    Hourly,
    /// Rotate logs daily
    Daily,
    /// Never rotate (single file)
    Never,
}
