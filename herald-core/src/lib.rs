//! # Herald Core
//!
//! Shared vocabulary of the Herald real-time client.
//!
//! This crate provides:
//! - `NewType` wrappers for notification ids and timestamps
//! - The `Notification` record and its REST page envelope
//! - The closed `ServerEvent` sum type decoded from wire frames
//! - Error types and severity classification
//! - Configuration loading with YAML/TOML/JSON support and environment overrides

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

/// Core type definitions and `NewType` wrappers
pub mod types;

/// Notification data structures
pub mod data;

/// Server-pushed and locally emitted events
pub mod event;

/// Error types and handling
pub mod error;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::data::*;
    pub use crate::event::*;
    pub use crate::types::*;
}
