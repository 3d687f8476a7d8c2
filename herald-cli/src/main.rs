//! # Herald CLI
//!
//! Command-line host for the Herald real-time notification client.
//!
//! This CLI provides commands for:
//! - Listening to a user's notification stream
//! - Checking configuration files
//! - Showing build information

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use herald_telemetry::logging::init_logging;

use commands::{config, listen};

/// Herald - real-time notification client
#[derive(Parser)]
#[command(name = "herald")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (YAML, TOML or JSON)
    #[arg(short, long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Connect and print notifications until Ctrl-C
    Listen(listen::ListenArgs),

    /// Validate and print the effective configuration
    CheckConfig(config::CheckConfigArgs),

    /// Show build information
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Listen(args) => {
            let mut config = commands::load_config(cli.config.as_deref())?;
            if cli.verbose {
                config.logging.level = "debug".to_string();
            }
            let _guards = init_logging(&config.logging).context("initializing logging")?;
            listen::run(&config, args).await?;
        }
        Commands::CheckConfig(args) => config::run(cli.config.as_deref(), &args)?,
        Commands::Info => print_info(),
    }

    Ok(())
}

fn print_info() {
    println!("Herald Notification Client");
    println!("==========================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Rust Edition: 2024");
    println!();
    println!("Transports:");
    println!("  - WebSocket (bearer-authenticated upgrade)");
    println!("  - HTTP long-polling fallback");
    println!();
    println!("Events:");
    for kind in herald_core::event::EventKind::DOMAIN {
        println!("  - {}", kind.wire_name());
    }
    println!();
    println!("Configuration:");
    println!("  HERALD_CONFIG, HERALD_TOKEN and HERALD_* overrides (see `herald check-config --env`)");
}
