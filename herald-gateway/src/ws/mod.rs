//! Event channel infrastructure.
//!
//! This module provides:
//! - [`ConnectionManager`]: bounded reconnection with backoff, heartbeat
//!   probes and status reporting
//! - Transport-neutral [`Frame`]s and the JSON [`Envelope`] codec
//! - Connection state management

mod config;
mod manager;
mod message;
mod state;

pub use config::{ConnectionConfig, ConnectionConfigBuilder, LongPollConfig};
pub use manager::ConnectionManager;
pub use message::{CloseReason, Decoded, Envelope, Frame, MessageCodec};
pub use state::ConnectionState;
