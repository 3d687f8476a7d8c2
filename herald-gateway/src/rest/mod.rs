//! REST client for the authoritative notification API.
//!
//! - `GET {base}/notifications?page&pageSize`
//! - `PATCH {base}/notifications/{id}/read`
//! - `POST {base}/notifications/mark-all-read`
//! - `DELETE {base}/notifications/{id}`

mod client;
mod config;
mod session;

pub use client::{NotificationApi, RestNotificationApi};
pub use config::{RestConfig, RestConfigBuilder};
pub use session::{SessionProvider, StaticToken};
