//! # Herald Gateway
//!
//! Network side of the Herald real-time client.
//!
//! This crate provides:
//! - [`ws::ConnectionManager`]: one authenticated event channel with
//!   bounded reconnection, heartbeats and status reporting
//! - [`transport`]: WebSocket transport with an HTTP long-poll fallback
//! - [`dispatch::EventDispatcher`]: per-event-kind fan-out with consumer
//!   isolation
//! - [`rest`]: client for the authoritative notification REST API
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use herald_gateway::dispatch::EventDispatcher;
//! use herald_gateway::transport;
//! use herald_gateway::ws::{ConnectionConfig, ConnectionManager};
//!
//! let config = ConnectionConfig::builder()
//!     .url("wss://events.example.com")
//!     .build();
//!
//! let dispatcher = Arc::new(EventDispatcher::new());
//! let manager = ConnectionManager::new(config.clone(), transport::from_config(&config)?, dispatcher);
//! manager.connect(&token)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

/// Event fan-out
pub mod dispatch;

/// REST client infrastructure
pub mod rest;

/// Event channel transports
pub mod transport;

/// Connection management
pub mod ws;

#[cfg(test)]
mod test_support;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatch::{
        CallbackConsumer, ChannelConsumer, DispatchReport, EventConsumer, EventDispatcher,
    };
    pub use crate::rest::{
        NotificationApi, RestConfig, RestNotificationApi, SessionProvider, StaticToken,
    };
    pub use crate::transport::{Transport, TransportSession};
    pub use crate::ws::{ConnectionConfig, ConnectionManager, ConnectionState};
}
