//! REST client configuration.

use herald_core::config::{Configurable, EnvOverride, Validatable, ValidationContext, Validator};
use herald_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for the notification REST API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Base URL for API requests.
    pub base_url: String,

    /// Request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Page size used for authoritative fetches.
    pub page_size: u32,

    /// User agent string.
    pub user_agent: String,

    /// Additional headers to include in requests.
    pub headers: BTreeMap<String, String>,
}

fn default_user_agent() -> String {
    format!("Herald/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(15),
            page_size: 50,
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
        }
    }
}

impl RestConfig {
    /// Creates a new builder for `RestConfig`.
    #[must_use]
    pub fn builder() -> RestConfigBuilder {
        RestConfigBuilder::default()
    }
}

impl Validatable for RestConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();
        ctx.enter("api");
        let mut v = Validator::new(&mut ctx);
        v.require_non_empty("base_url", &self.base_url)
            .non_zero_duration("timeout", self.timeout)
            .in_range("page_size", &self.page_size, &1, &500)
            .require_non_empty("user_agent", &self.user_agent);
        if !self.base_url.trim().is_empty() {
            v.url_scheme("base_url", &self.base_url, &["http", "https"]);
        }
        ctx.into_result()
    }
}

impl Configurable for RestConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        EnvOverride::apply_string(&format!("{prefix}_API_URL"), &mut self.base_url);
        EnvOverride::apply_duration(&format!("{prefix}_API_TIMEOUT"), &mut self.timeout)?;
        EnvOverride::apply_number(&format!("{prefix}_API_PAGE_SIZE"), &mut self.page_size)
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        vec![
            format!("{prefix}_API_URL"),
            format!("{prefix}_API_TIMEOUT"),
            format!("{prefix}_API_PAGE_SIZE"),
        ]
    }
}

/// Builder for `RestConfig`.
#[derive(Debug, Default)]
pub struct RestConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    page_size: Option<u32>,
    user_agent: Option<String>,
    headers: BTreeMap<String, String>,
}

impl RestConfigBuilder {
    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the `RestConfig`.
    #[must_use]
    pub fn build(self) -> RestConfig {
        let defaults = RestConfig::default();
        RestConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            headers: self.headers,
        }
    }
}
