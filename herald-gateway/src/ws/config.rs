//! Event channel configuration.

use herald_core::config::{Configurable, EnvOverride, Validatable, ValidationContext, Validator};
use herald_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the [`ConnectionManager`](super::ConnectionManager).
///
/// Contains the endpoint, reconnection curve, heartbeat cadence and the
/// long-poll fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Base URL of the event server (`ws://` or `wss://`).
    pub url: String,

    /// Namespace path appended to `url`.
    pub path: String,

    /// Timeout for a single transport open.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Consecutive failures after which the manager gives up.
    pub max_reconnect_attempts: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde")]
    pub reconnect_delay: Duration,

    /// Ceiling for the retry delay.
    #[serde(with = "humantime_serde")]
    pub max_reconnect_delay: Duration,

    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,

    /// Interval between heartbeat probes while connected.
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,

    /// Capacity of the per-session frame channels.
    pub channel_capacity: usize,

    /// HTTP long-poll fallback.
    pub long_poll: LongPollConfig,
}

/// Long-poll fallback used when the WebSocket cannot be opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongPollConfig {
    /// Whether to fall back at all.
    pub enabled: bool,

    /// Explicit poll URL. Derived from the WebSocket URL when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Poll path, used when `url` is absent.
    pub path: String,

    /// How long the server may hold a poll open.
    #[serde(with = "humantime_serde")]
    pub poll_timeout: Duration,
}

impl Default for LongPollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            path: "/events/poll".to_string(),
            poll_timeout: Duration::from_secs(25),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            path: "/events".to_string(),
            connect_timeout: Duration::from_secs(10),
            max_reconnect_attempts: 20,
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(5),
            backoff_multiplier: 1.5,
            heartbeat_interval: Duration::from_secs(30),
            channel_capacity: 256,
            long_poll: LongPollConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a new builder for `ConnectionConfig`.
    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Full WebSocket endpoint: `url` joined with `path`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        join(&self.url, &self.path)
    }

    /// Full long-poll endpoint.
    ///
    /// Uses `long_poll.url` when set, otherwise swaps the WebSocket scheme
    /// for its HTTP counterpart and appends `long_poll.path`.
    #[must_use]
    pub fn poll_endpoint(&self) -> String {
        if let Some(url) = &self.long_poll.url {
            return url.clone();
        }
        let base = if let Some(rest) = self.url.strip_prefix("wss://") {
            format!("https://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("ws://") {
            format!("http://{rest}")
        } else {
            self.url.clone()
        };
        join(&base, &self.long_poll.path)
    }

    /// Delay to wait before retry number `attempt` (1-based).
    ///
    /// `min(reconnect_delay * multiplier^(attempt - 1), max_reconnect_delay)`
    #[must_use]
    pub fn reconnect_delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = self.reconnect_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_reconnect_delay.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_reconnect_delay
        }
    }
}

fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

impl Validatable for ConnectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();
        ctx.enter("connection");
        {
            let mut v = Validator::new(&mut ctx);
            v.require_non_empty("url", &self.url)
                .non_zero_duration("connect_timeout", self.connect_timeout)
                .positive("max_reconnect_attempts", &self.max_reconnect_attempts)
                .non_zero_duration("reconnect_delay", self.reconnect_delay)
                .ordered(
                    "max_reconnect_delay",
                    self.reconnect_delay,
                    self.max_reconnect_delay,
                )
                .in_range("backoff_multiplier", &self.backoff_multiplier, &1.0, &10.0)
                .non_zero_duration("heartbeat_interval", self.heartbeat_interval)
                .positive("channel_capacity", &self.channel_capacity);
            if !self.url.trim().is_empty() {
                v.url_scheme("url", &self.url, &["ws", "wss"]);
            }
        }
        if self.long_poll.enabled {
            ctx.enter("long_poll");
            let mut v = Validator::new(&mut ctx);
            v.non_zero_duration("poll_timeout", self.long_poll.poll_timeout);
            if let Some(url) = &self.long_poll.url {
                v.url_scheme("url", url, &["http", "https"]);
            }
            ctx.exit();
        }
        ctx.into_result()
    }
}

impl Configurable for ConnectionConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        EnvOverride::apply_string(&format!("{prefix}_WS_URL"), &mut self.url);
        EnvOverride::apply_string(&format!("{prefix}_WS_PATH"), &mut self.path);
        EnvOverride::apply_number(
            &format!("{prefix}_MAX_RECONNECT_ATTEMPTS"),
            &mut self.max_reconnect_attempts,
        )?;
        EnvOverride::apply_duration(
            &format!("{prefix}_HEARTBEAT_INTERVAL"),
            &mut self.heartbeat_interval,
        )?;
        EnvOverride::apply_bool(
            &format!("{prefix}_LONG_POLL_ENABLED"),
            &mut self.long_poll.enabled,
        )?;
        EnvOverride::apply_optional_string(
            &format!("{prefix}_LONG_POLL_URL"),
            &mut self.long_poll.url,
        );
        Ok(())
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        [
            "WS_URL",
            "WS_PATH",
            "MAX_RECONNECT_ATTEMPTS",
            "HEARTBEAT_INTERVAL",
            "LONG_POLL_ENABLED",
            "LONG_POLL_URL",
        ]
        .iter()
        .map(|name| format!("{prefix}_{name}"))
        .collect()
    }
}

/// Builder for `ConnectionConfig`.
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Sets the base URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the namespace path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Sets the open timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the attempt limit.
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the initial retry delay.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Sets the retry delay ceiling.
    #[must_use]
    pub fn max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.max_reconnect_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.config.backoff_multiplier = multiplier;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Sets the frame channel capacity.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Enables or disables the long-poll fallback.
    #[must_use]
    pub fn long_poll_enabled(mut self, enabled: bool) -> Self {
        self.config.long_poll.enabled = enabled;
        self
    }

    /// Sets an explicit long-poll URL.
    #[must_use]
    pub fn long_poll_url(mut self, url: impl Into<String>) -> Self {
        self.config.long_poll.url = Some(url.into());
        self
    }

    /// Builds the `ConnectionConfig`.
    #[must_use]
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}
