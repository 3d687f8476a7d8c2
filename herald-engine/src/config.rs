//! Top-level client configuration.

use std::time::Duration;

use herald_core::config::{Configurable, EnvOverride, Validatable, ValidationContext, Validator};
use herald_core::error::ConfigError;
use herald_gateway::rest::RestConfig;
use herald_gateway::ws::ConnectionConfig;
use herald_telemetry::logging::LogConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "HERALD";

/// Complete client configuration.
///
/// # Example YAML
///
/// ```yaml
/// connection:
///   url: "wss://events.example.com"
///   path: "/events"
///   max_reconnect_attempts: 20
///   heartbeat_interval: 30s
///
/// api:
///   base_url: "https://api.example.com/v1"
///
/// sync:
///   reconcile_interval: 5m
///   push_debounce: 2s
///
/// logging:
///   level: info
///   format: pretty
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Event channel.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Notification REST API.
    #[serde(default)]
    pub api: RestConfig,

    /// Store reconciliation.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LogConfig,
}

impl Validatable for HeraldConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();
        ctx.absorb(self.connection.validate());
        ctx.absorb(self.api.validate());
        ctx.absorb(self.sync.validate());
        ctx.absorb(self.logging.validate());
        ctx.into_result()
    }
}

impl Configurable for HeraldConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        self.connection.apply_env_overrides(prefix)?;
        self.api.apply_env_overrides(prefix)?;
        self.sync.apply_env_overrides(prefix)?;
        self.logging.apply_env_overrides(prefix)
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        let mut names = ConnectionConfig::env_var_names(prefix);
        names.extend(RestConfig::env_var_names(prefix));
        names.extend(SyncConfig::env_var_names(prefix));
        names.extend(LogConfig::env_var_names(prefix));
        names
    }
}

/// When the store is reconciled against the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Periodic reconciliation interval.
    #[serde(with = "humantime_serde")]
    pub reconcile_interval: Duration,

    /// Quiet period after the last push before reconciling.
    #[serde(with = "humantime_serde")]
    pub push_debounce: Duration,

    /// Reconcile when the event channel comes back after a loss.
    pub reconcile_on_reconnect: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(300),
            push_debounce: Duration::from_secs(2),
            reconcile_on_reconnect: true,
        }
    }
}

impl Validatable for SyncConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();
        ctx.enter("sync");
        Validator::new(&mut ctx)
            .non_zero_duration("reconcile_interval", self.reconcile_interval)
            .non_zero_duration("push_debounce", self.push_debounce)
            .ordered("reconcile_interval", self.push_debounce, self.reconcile_interval);
        ctx.into_result()
    }
}

impl Configurable for SyncConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        EnvOverride::apply_duration(
            &format!("{prefix}_RECONCILE_INTERVAL"),
            &mut self.reconcile_interval,
        )?;
        EnvOverride::apply_duration(&format!("{prefix}_PUSH_DEBOUNCE"), &mut self.push_debounce)
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        vec![
            format!("{prefix}_RECONCILE_INTERVAL"),
            format!("{prefix}_PUSH_DEBOUNCE"),
        ]
    }
}
