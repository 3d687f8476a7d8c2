//! Paged REST listing of notifications.

use serde::{Deserialize, Serialize};

use super::Notification;

/// Paging metadata returned alongside a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page (1-based).
    #[serde(default)]
    pub page: u32,
    /// Page size used by the server.
    #[serde(default)]
    pub page_size: u32,
    /// Total records across all pages.
    #[serde(default)]
    pub total: u64,
    /// Total unread records, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

/// One page of the authoritative notification listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPage {
    /// Records, newest first.
    #[serde(default)]
    pub items: Vec<Notification>,
    /// Paging metadata.
    #[serde(default)]
    pub meta: PageMeta,
}
