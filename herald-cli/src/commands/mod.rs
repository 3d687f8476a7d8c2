//! Subcommand implementations.

pub mod config;
pub mod listen;

use std::path::Path;

use anyhow::{Context, Result};
use herald_core::config::ConfigLoader;
use herald_engine::config::{ENV_PREFIX, HeraldConfig};

/// Loads the configuration file, or defaults plus `HERALD_*` overrides
/// when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<HeraldConfig> {
    let loader = ConfigLoader::new().with_env_prefix(ENV_PREFIX);
    match path {
        Some(path) => loader
            .load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => loader
            .load_defaults()
            .context("building configuration from HERALD_* variables"),
    }
}
