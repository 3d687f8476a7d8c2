//! Notification data structures.
//!
//! - [`Notification`] - one user-facing event record
//! - [`NotificationType`] - presentation category
//! - [`RelatedEntity`] / [`EntityKind`] - deep-link target of a notification
//! - [`NotificationPage`] - one page of the authoritative REST listing

mod notification;
mod page;

pub use notification::{EntityKind, Notification, NotificationRecord, NotificationType, RelatedEntity};
pub use page::{NotificationPage, PageMeta};
