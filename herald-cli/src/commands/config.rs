//! `check-config`: load, validate and print the effective configuration.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use herald_core::config::{ConfigFormat, ConfigLoader, Configurable};
use herald_engine::config::{ENV_PREFIX, HeraldConfig};
use herald_telemetry::masking::SensitiveDataMasker;

/// Output format for the effective configuration.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// YAML
    #[default]
    Yaml,
    /// TOML
    Toml,
    /// JSON
    Json,
}

impl From<OutputFormat> for ConfigFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => Self::Yaml,
            OutputFormat::Toml => Self::Toml,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Arguments for the check-config command
#[derive(Debug, Parser)]
pub struct CheckConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// List the environment variables that override settings
    #[arg(long)]
    pub env: bool,
}

/// Runs the command.
pub fn run(config_path: Option<&Path>, args: &CheckConfigArgs) -> Result<()> {
    let config = super::load_config(config_path)?;
    println!("{}", render(&config, args.format)?);

    if args.env {
        println!();
        println!("Environment overrides:");
        for name in HeraldConfig::env_var_names(ENV_PREFIX) {
            let state = if std::env::var_os(&name).is_some() { "set" } else { "unset" };
            println!("  {name:<32} {state}");
        }
    }
    Ok(())
}

/// Serializes `config` with credentials masked.
pub fn render(config: &HeraldConfig, format: OutputFormat) -> Result<String> {
    let text = ConfigLoader::serialize(config, format.into()).context("serializing configuration")?;
    Ok(SensitiveDataMasker::new().mask_string(&text).into_owned())
}
