//! Structured logging setup.
//!
//! One `tracing-subscriber` registry with an `EnvFilter` and one fmt layer
//! per configured output. File outputs write through a non-blocking
//! `tracing-appender` worker whose guard the caller keeps alive.

mod config;

pub use config::{LogConfig, LogFormat, LogOutput, RotationConfig};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_FILE_NAME: &str = "herald.log";

/// Installs the global subscriber.
///
/// Returns the appender guards; dropping them flushes and stops file
/// output.
///
/// ```no_run
/// use herald_telemetry::logging::{init_logging, LogConfig};
///
/// let _guards = init_logging(&LogConfig::default()).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<Vec<WorkerGuard>, LoggingError> {
    let mut guards = Vec::new();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| LoggingError::InvalidConfig(format!("level '{}': {e}", config.level)))?,
    };

    let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

    for output in &config.outputs {
        match output {
            LogOutput::Stdout => layers.push(stdout_layer(config)),
            LogOutput::File { path, rotation } => {
                std::fs::create_dir_all(path)?;
                let (layer, guard) = file_layer(config, path, rotation.as_ref());
                layers.push(layer);
                guards.push(guard);
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guards)
}

fn span_events(config: &LogConfig) -> FmtSpan {
    if config.include_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

fn stdout_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info)
        .with_span_events(span_events(config));

    match config.format {
        LogFormat::Json => base.json().flatten_event(true).boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
    }
}

fn file_layer<S>(
    config: &LogConfig,
    path: &str,
    rotation: Option<&RotationConfig>,
) -> (Box<dyn Layer<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let appender = match rotation.copied().unwrap_or(RotationConfig::Daily) {
        RotationConfig::Hourly => tracing_appender::rolling::hourly(path, LOG_FILE_NAME),
        RotationConfig::Daily => tracing_appender::rolling::daily(path, LOG_FILE_NAME),
        RotationConfig::Never => tracing_appender::rolling::never(path, LOG_FILE_NAME),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // Files are always JSON regardless of the console format.
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info)
        .with_span_events(span_events(config))
        .json()
        .flatten_event(true)
        .boxed();

    (layer, guard)
}

/// Errors that can occur during logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid logging configuration: {0}")]
    InvalidConfig(String),

    /// A global subscriber is already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_events_toggle() {
        let mut config = LogConfig::default();
        assert_eq!(span_events(&config), FmtSpan::NONE);
        config.include_span_events = true;
        assert_eq!(span_events(&config), FmtSpan::NEW | FmtSpan::CLOSE);
    }
}
