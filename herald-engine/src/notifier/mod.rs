//! Client-side notification handling.
//!
//! ```text
//!  ConnectionManager ──dispatch──▶ SessionConsumer ──insert_pushed──▶ NotificationStore
//!                                        │                                  ▲
//!                                        ├──present──▶ NotificationSurface  │ replace_all
//!                                        │                                  │
//!                                        └──signal──▶ sync worker ──list──▶ NotificationApi
//! ```
//!
//! [`NotificationCoordinator`] owns the store and the session lifecycle;
//! [`to_notification`] maps pushed events to records.

mod coordinator;
mod mapping;
mod session;
mod store;
mod surface;

pub use coordinator::NotificationCoordinator;
pub use mapping::to_notification;
pub use session::{SessionGuard, SessionTracker};
pub use store::{NotificationStore, StoreSummary};
pub use surface::{ChannelSurface, LogSurface, NotificationSurface, SurfaceError, present_all};
