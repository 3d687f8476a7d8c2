//! `listen`: run one session and print what happens until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use herald_engine::config::HeraldConfig;
use herald_engine::notifier::{LogSurface, NotificationCoordinator};
use herald_gateway::rest::StaticToken;
use herald_telemetry::masking::Sensitive;
use tracing::info;

/// Arguments for the listen command
#[derive(Debug, Parser)]
pub struct ListenArgs {
    /// Access token for the event channel and the REST API
    #[arg(long, env = "HERALD_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Print the full list after every change instead of the counters
    #[arg(long)]
    pub list: bool,
}

/// Runs the command.
pub async fn run(config: &HeraldConfig, args: ListenArgs) -> Result<()> {
    let token = Sensitive::new(args.token);
    let coordinator = NotificationCoordinator::from_config(
        config,
        Arc::new(StaticToken::new(token.expose().clone())),
    )
    .context("building notification client")?
    .with_surface(Arc::new(LogSurface));

    let mut changes = coordinator.store().changes();
    let mut states = coordinator.subscribe_state();

    info!(token = %token.preview(), endpoint = %config.connection.endpoint(), "Starting session");
    coordinator
        .start_session(token.expose())
        .await
        .context("starting session")?;
    print_store(&coordinator, args.list);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for Ctrl-C")?;
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_store(&coordinator, args.list);
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                println!("connection: {state}");
            }
        }
    }

    info!("Ending session");
    coordinator.end_session().await;
    Ok(())
}

fn print_store(coordinator: &NotificationCoordinator, list: bool) {
    let summary = coordinator.store().summary();
    let loading = if summary.loading { " (loading)" } else { "" };
    println!(
        "notifications: {} total, {} unread{loading}",
        summary.total, summary.unread
    );
    if list {
        for n in coordinator.store().snapshot() {
            let marker = if n.is_read { ' ' } else { '*' };
            println!(
                "  {marker} [{}] {} - {} ({})",
                n.notification_type,
                n.title,
                n.message,
                n.created_at.to_rfc3339()
            );
        }
    }
}
