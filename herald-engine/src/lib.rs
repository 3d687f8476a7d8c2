//! # Herald Engine
//!
//! Notification state for the Herald real-time client.
//!
//! This crate provides:
//! - [`notifier::NotificationStore`]: the user's notifications with a
//!   derived unread counter
//! - [`notifier::NotificationCoordinator`]: session lifecycle, optimistic
//!   push handling and reconciliation against the REST API
//! - [`config::HeraldConfig`]: the complete client configuration
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use herald_core::config::ConfigLoader;
//! use herald_engine::config::{ENV_PREFIX, HeraldConfig};
//! use herald_engine::notifier::NotificationCoordinator;
//! use herald_gateway::rest::StaticToken;
//!
//! let config: HeraldConfig = ConfigLoader::new().with_env_prefix(ENV_PREFIX).load("herald.yaml")?;
//! let coordinator = NotificationCoordinator::from_config(&config, Arc::new(StaticToken::new(&token)))?;
//!
//! coordinator.start_session(&token).await?;
//! println!("{} unread", coordinator.store().unread_count());
//! coordinator.end_session().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Client configuration
pub mod config;

/// Notification store and coordinator
pub mod notifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{HeraldConfig, SyncConfig};
    pub use crate::notifier::{
        LogSurface, NotificationCoordinator, NotificationStore, NotificationSurface, StoreSummary,
    };
}
