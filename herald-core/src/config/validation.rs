//! Validation and environment override helpers.

use crate::error::ConfigError;
use std::time::Duration;

/// Result type for validation operations.
pub type ValidationResult = Result<(), ConfigError>;

/// Tracks the current section path and collects errors so a whole document
/// can be checked in one pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    path: Vec<String>,
    errors: Vec<ConfigError>,
}

impl ValidationContext {
    /// Creates a new validation context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a section.
    pub fn enter(&mut self, section: impl Into<String>) {
        self.path.push(section.into());
    }

    /// Leaves the current section.
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Returns the current path as a dot-separated string.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Records an error.
    pub fn add_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Records the error of a nested section's own validation, if any.
    pub fn absorb(&mut self, result: ValidationResult) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    /// Returns true if no errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the collected errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Consumes the context. A single error is returned as-is; several are
    /// folded into one `ValidationFailed`.
    pub fn into_result(mut self) -> ValidationResult {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ConfigError::ValidationFailed {
                reason: self
                    .errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
        }
    }

    /// Creates a missing field error qualified by the current path.
    #[must_use]
    pub fn missing_field(&self, field: impl Into<String>) -> ConfigError {
        let section = (!self.path.is_empty()).then(|| self.current_path());
        ConfigError::MissingField {
            field: field.into(),
            section,
        }
    }

    /// Creates an invalid value error qualified by the current path.
    #[must_use]
    pub fn invalid_value(&self, field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
        let field = field.into();
        let field = if self.path.is_empty() {
            field
        } else {
            format!("{}.{field}", self.current_path())
        };
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Fluent field checks that record into a [`ValidationContext`].
#[derive(Debug)]
pub struct Validator<'a> {
    ctx: &'a mut ValidationContext,
}

impl<'a> Validator<'a> {
    /// Creates a validator writing into `ctx`.
    pub fn new(ctx: &'a mut ValidationContext) -> Self {
        Self { ctx }
    }

    /// String must not be empty or whitespace.
    pub fn require_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            let err = self.ctx.missing_field(field);
            self.ctx.add_error(err);
        }
        self
    }

    /// Value must lie in `[min, max]`.
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
        min: &T,
        max: &T,
    ) -> &mut Self {
        if value < min || value > max {
            let err = self
                .ctx
                .invalid_value(field, format!("Value {value} must be between {min} and {max}"));
            self.ctx.add_error(err);
        }
        self
    }

    /// Value must be strictly positive.
    pub fn positive<T: PartialOrd + Default + std::fmt::Display>(
        &mut self,
        field: &str,
        value: &T,
    ) -> &mut Self {
        if *value <= T::default() {
            let err = self
                .ctx
                .invalid_value(field, format!("Value {value} must be positive"));
            self.ctx.add_error(err);
        }
        self
    }

    /// Duration must be non-zero.
    pub fn non_zero_duration(&mut self, field: &str, value: Duration) -> &mut Self {
        if value.is_zero() {
            let err = self.ctx.invalid_value(field, "Duration must be greater than zero");
            self.ctx.add_error(err);
        }
        self
    }

    /// `lower` must not exceed `upper`.
    pub fn ordered(&mut self, field: &str, lower: Duration, upper: Duration) -> &mut Self {
        if lower > upper {
            let err = self.ctx.invalid_value(
                field,
                format!("{lower:?} must not exceed {upper:?}"),
            );
            self.ctx.add_error(err);
        }
        self
    }

    /// URL must use one of `schemes`.
    pub fn url_scheme(&mut self, field: &str, value: &str, schemes: &[&str]) -> &mut Self {
        let ok = value
            .split_once("://")
            .is_some_and(|(scheme, rest)| schemes.contains(&scheme) && !rest.is_empty());
        if !ok {
            let err = self.ctx.invalid_value(
                field,
                format!("Must be a URL with scheme {}", schemes.join(" or ")),
            );
            self.ctx.add_error(err);
        }
        self
    }

    /// Records `error_msg` unless `predicate` holds.
    pub fn custom<F>(&mut self, field: &str, predicate: F, error_msg: &str) -> &mut Self
    where
        F: FnOnce() -> bool,
    {
        if !predicate() {
            let err = self.ctx.invalid_value(field, error_msg);
            self.ctx.add_error(err);
        }
        self
    }
}

/// Reads `{PREFIX}_{FIELD}` variables into configuration fields.
///
/// Unset variables leave the target untouched. Set variables that fail to
/// parse are reported.
///
/// ```rust
/// use herald_core::config::EnvOverride;
///
/// let mut attempts = 20u32;
/// EnvOverride::apply_number("HERALD_DOCTEST_UNSET", &mut attempts).unwrap();
/// assert_eq!(attempts, 20);
/// ```
pub struct EnvOverride;

impl EnvOverride {
    /// Overrides a string.
    pub fn apply_string(var_name: &str, target: &mut String) {
        if let Ok(value) = std::env::var(var_name) {
            *target = value;
        }
    }

    /// Overrides an optional string. An empty value clears it.
    pub fn apply_optional_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(var_name) {
            *target = (!value.is_empty()).then_some(value);
        }
    }

    /// Overrides anything that implements `FromStr`.
    pub fn apply_number<T: std::str::FromStr>(var_name: &str, target: &mut T) -> ValidationResult
    where
        T::Err: std::fmt::Display,
    {
        if let Ok(value) = std::env::var(var_name) {
            *target = value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid_env(var_name, e.to_string()))?;
        }
        Ok(())
    }

    /// Overrides a boolean (`true/false`, `1/0`, `yes/no`, `on/off`).
    pub fn apply_bool(var_name: &str, target: &mut bool) -> ValidationResult {
        if let Ok(value) = std::env::var(var_name) {
            *target = match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::invalid_env(
                        var_name,
                        format!("'{other}' is not a boolean"),
                    ));
                }
            };
        }
        Ok(())
    }

    /// Overrides a duration written in humantime form (`30s`, `1m 30s`,
    /// `500ms`).
    pub fn apply_duration(var_name: &str, target: &mut Duration) -> ValidationResult {
        if let Ok(value) = std::env::var(var_name) {
            *target = humantime_serde::re::humantime::parse_duration(value.trim())
                .map_err(|e| ConfigError::invalid_env(var_name, e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_context_path() {
        let mut ctx = ValidationContext::new();
        ctx.enter("connection");
        ctx.enter("fallback");
        assert_eq!(ctx.current_path(), "connection.fallback");
        ctx.exit();
        assert_eq!(ctx.current_path(), "connection");
        ctx.exit();
        assert_eq!(ctx.current_path(), "");
    }

    #[test]
    fn test_errors_are_path_qualified() {
        let mut ctx = ValidationContext::new();
        ctx.enter("connection");
        Validator::new(&mut ctx).positive("max_reconnect_attempts", &0u32);
        let err = ctx.into_result().unwrap_err();
        assert!(err.to_string().contains("connection.max_reconnect_attempts"));
    }

    #[test]
    fn test_multiple_errors_fold() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx)
            .require_non_empty("url", " ")
            .non_zero_duration("heartbeat_interval", Duration::ZERO);
        assert_eq!(ctx.errors().len(), 2);
        assert!(matches!(
            ctx.into_result(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_url_scheme() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx)
            .url_scheme("url", "wss://api.example.com/events", &["ws", "wss"])
            .url_scheme("base_url", "https://api.example.com", &["http", "https"]);
        assert!(ctx.is_valid());

        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx).url_scheme("url", "https://api.example.com", &["ws", "wss"]);
        assert!(!ctx.is_valid());

        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx).url_scheme("url", "wss://", &["wss"]);
        assert!(!ctx.is_valid());
    }

    #[test]
    fn test_ordered_durations() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx).ordered(
            "reconnect_delay",
            Duration::from_secs(10),
            Duration::from_secs(5),
        );
        assert!(!ctx.is_valid());
    }

    #[test]
    fn test_env_duration_override() {
        let mut value = Duration::from_secs(30);
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("HERALD_VALIDATION_TEST_HEARTBEAT", "1m 30s") };
        EnvOverride::apply_duration("HERALD_VALIDATION_TEST_HEARTBEAT", &mut value).unwrap();
        unsafe { std::env::remove_var("HERALD_VALIDATION_TEST_HEARTBEAT") };
        assert_eq!(value, Duration::from_secs(90));
    }

    #[test]
    fn test_env_bool_rejects_garbage() {
        let mut value = false;
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("HERALD_VALIDATION_TEST_BOOL", "maybe") };
        let result = EnvOverride::apply_bool("HERALD_VALIDATION_TEST_BOOL", &mut value);
        unsafe { std::env::remove_var("HERALD_VALIDATION_TEST_BOOL") };
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
        assert!(!value);
    }

    #[test]
    fn test_unset_env_is_noop() {
        let mut value = Some("keep".to_string());
        EnvOverride::apply_optional_string("HERALD_VALIDATION_TEST_UNSET", &mut value);
        assert_eq!(value.as_deref(), Some("keep"));
    }
}
