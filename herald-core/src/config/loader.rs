//! File and string loading for configuration documents.

use crate::config::{Configurable, Validatable};
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml)
    #[default]
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "yaml" | "yml" => Some(Self::Yaml),
                "toml" => Some(Self::Toml),
                "json" => Some(Self::Json),
                _ => None,
            })
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Loads configuration documents, applies environment overrides and
/// validates the result.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    validate: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that validates and applies no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_prefix: None,
            validate: true,
        }
    }

    /// Sets the environment variable prefix for overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets whether [`ConfigLoader::load`] validates. Default is `true`.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Returns the environment variable prefix, if set.
    #[must_use]
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Loads a file, applies overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override
    /// is malformed, or validation fails.
    pub fn load<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Configurable + Validatable,
        P: AsRef<Path>,
    {
        let config = self.load_file(path)?;
        self.finish(config)
    }

    /// Starts from `T::default()`, applies overrides and validates.
    ///
    /// Used when no configuration file is given.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is malformed or validation fails.
    pub fn load_defaults<T>(&self) -> Result<T, ConfigError>
    where
        T: Default + Configurable + Validatable,
    {
        self.finish(T::default())
    }

    fn finish<T>(&self, mut config: T) -> Result<T, ConfigError>
    where
        T: Configurable + Validatable,
    {
        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix)?;
        }
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    /// Parses a file without overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized or the file
    /// cannot be read or parsed.
    pub fn load_file<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        parse(&content, format, &path.display().to_string())
    }

    /// Parses a string in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be parsed.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        parse(content, format, "<string>")
    }

    /// Serializes a configuration in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize<T>(config: &T, format: ConfigFormat) -> Result<String, ConfigError>
    where
        T: serde::Serialize,
    {
        let invalid = |kind: &str, e: String| ConfigError::InvalidFormat {
            path: "<serialize>".to_string(),
            reason: format!("{kind} serialization error: {e}"),
        };
        match format {
            ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| invalid("YAML", e.to_string())),
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| invalid("TOML", e.to_string()))
            }
            ConfigFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| invalid("JSON", e.to_string()))
            }
        }
    }

    /// Writes a configuration file, format chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized, serialization
    /// fails, or the file cannot be written.
    pub fn save_file<T, P>(config: &T, path: P) -> Result<(), ConfigError>
    where
        T: serde::Serialize,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })?;

        let content = Self::serialize(config, format)?;

        std::fs::write(path, content).map_err(|e| ConfigError::FileWriteError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn parse<T: DeserializeOwned>(
    content: &str,
    format: ConfigFormat,
    origin: &str,
) -> Result<T, ConfigError> {
    let invalid = |kind: &str, e: String| ConfigError::InvalidFormat {
        path: origin.to_string(),
        reason: format!("{kind} parse error: {e}"),
    };
    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| invalid("YAML", e.to_string())),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| invalid("TOML", e.to_string())),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| invalid("JSON", e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvOverride;
    use serde::{Deserialize, Serialize};
    use std::io::Write;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct EndpointConfig {
        url: String,
        #[serde(default = "default_attempts")]
        max_attempts: u32,
    }

    fn default_attempts() -> u32 {
        20
    }

    impl Default for EndpointConfig {
        fn default() -> Self {
            Self {
                url: "wss://localhost/events".to_string(),
                max_attempts: default_attempts(),
            }
        }
    }

    impl Validatable for EndpointConfig {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.max_attempts == 0 {
                return Err(ConfigError::invalid_value("max_attempts", "must be positive"));
            }
            Ok(())
        }
    }

    impl Configurable for EndpointConfig {
        fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
            EnvOverride::apply_string(&format!("{prefix}_URL"), &mut self.url);
            EnvOverride::apply_number(&format!("{prefix}_MAX_ATTEMPTS"), &mut self.max_attempts)
        }

        fn env_var_names(prefix: &str) -> Vec<String> {
            vec![format!("{prefix}_URL"), format!("{prefix}_MAX_ATTEMPTS")]
        }
    }

    fn temp_file(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("herald.yml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("herald.TOML")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("herald.txt")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("herald")), None);
    }

    #[test]
    fn test_load_each_format() {
        let loader = ConfigLoader::new();
        let yaml: EndpointConfig = loader
            .load_str("url: wss://a/events\nmax_attempts: 3\n", ConfigFormat::Yaml)
            .unwrap();
        let toml: EndpointConfig = loader
            .load_str("url = \"wss://a/events\"\nmax_attempts = 3\n", ConfigFormat::Toml)
            .unwrap();
        let json: EndpointConfig = loader
            .load_str(r#"{"url": "wss://a/events", "max_attempts": 3}"#, ConfigFormat::Json)
            .unwrap();
        assert_eq!(yaml, toml);
        assert_eq!(toml, json);
    }

    #[test]
    fn test_invalid_yaml_reports_origin() {
        let loader = ConfigLoader::new();
        let err = loader
            .load_str::<EndpointConfig>("url: [unterminated", ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { .. }));
        assert!(err.to_string().contains("YAML parse error"));
    }

    #[test]
    fn test_load_file_validates() {
        let file = temp_file("yaml", "url: wss://a/events\nmax_attempts: 0\n");
        let err = ConfigLoader::new()
            .load::<EndpointConfig, _>(file.path())
            .unwrap_err();
        assert!(err.to_string().contains("max_attempts"));

        let config: EndpointConfig = ConfigLoader::new()
            .with_validation(false)
            .load(file.path())
            .unwrap();
        assert_eq!(config.max_attempts, 0);
    }

    #[test]
    fn test_env_override_applied_on_load() {
        let file = temp_file("toml", "url = \"wss://a/events\"\n");
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("HERALD_LOADER_TEST_MAX_ATTEMPTS", "7") };
        let config: EndpointConfig = ConfigLoader::new()
            .with_env_prefix("HERALD_LOADER_TEST")
            .load(file.path())
            .unwrap();
        unsafe { std::env::remove_var("HERALD_LOADER_TEST_MAX_ATTEMPTS") };
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.url, "wss://a/events");
    }

    #[test]
    fn test_malformed_env_override_is_rejected() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("HERALD_LOADER_BAD_MAX_ATTEMPTS", "many") };
        let result = ConfigLoader::new()
            .with_env_prefix("HERALD_LOADER_BAD")
            .load_defaults::<EndpointConfig>();
        unsafe { std::env::remove_var("HERALD_LOADER_BAD_MAX_ATTEMPTS") };
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .load_file::<EndpointConfig, _>("/nonexistent/herald.yaml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.json");
        let config = EndpointConfig::default();
        ConfigLoader::save_file(&config, &path).unwrap();
        let loaded: EndpointConfig = ConfigLoader::new().load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
