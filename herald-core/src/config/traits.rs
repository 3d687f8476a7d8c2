//! Traits implemented by every configuration section.

use crate::error::ConfigError;

/// A configuration section that can check itself.
///
/// ```rust
/// use herald_core::config::Validatable;
/// use herald_core::error::ConfigError;
///
/// struct SyncConfig {
///     page_size: u32,
/// }
///
/// impl Validatable for SyncConfig {
///     fn validate(&self) -> Result<(), ConfigError> {
///         if self.page_size == 0 {
///             return Err(ConfigError::invalid_value("page_size", "must be positive"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// A configuration section that accepts environment overrides.
///
/// Variable names are `{prefix}_{FIELD}`, upper snake case. A variable that
/// is set but does not parse is an error rather than being ignored.
pub trait Configurable: Sized {
    /// Applies environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a set variable does not parse.
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError>;

    /// Returns the environment variable names this section reads.
    fn env_var_names(prefix: &str) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvOverride;

    struct PollConfig {
        page_size: u32,
    }

    impl Validatable for PollConfig {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.page_size == 0 {
                return Err(ConfigError::invalid_value("page_size", "must be positive"));
            }
            Ok(())
        }
    }

    impl Configurable for PollConfig {
        fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
            EnvOverride::apply_number(&format!("{prefix}_PAGE_SIZE"), &mut self.page_size)
        }

        fn env_var_names(prefix: &str) -> Vec<String> {
            vec![format!("{prefix}_PAGE_SIZE")]
        }
    }

    #[test]
    fn test_validatable() {
        assert!(PollConfig { page_size: 20 }.validate().is_ok());
        let err = PollConfig { page_size: 0 }.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(
            PollConfig::env_var_names("HERALD_TRAITS_TEST"),
            vec!["HERALD_TRAITS_TEST_PAGE_SIZE".to_string()]
        );
    }

    #[test]
    fn test_unset_override_is_noop() {
        let mut config = PollConfig { page_size: 20 };
        config.apply_env_overrides("HERALD_TRAITS_UNSET").unwrap();
        assert_eq!(config.page_size, 20);
    }
}
