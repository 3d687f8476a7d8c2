//! In-memory notification store.
//!
//! Holds the user's notifications newest first together with a derived
//! unread counter and a loading flag. Every operation is synchronous,
//! never touches the network and is a no-op on unknown ids, so pushes and
//! in-flight REST results can interleave freely.

use herald_core::data::Notification;
use herald_core::types::NotificationId;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Published after every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    /// Incremented on every effective change.
    pub revision: u64,
    /// Number of records.
    pub total: usize,
    /// Number of unread records.
    pub unread: usize,
    /// Whether an authoritative fetch is in flight.
    pub loading: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    notifications: Vec<Notification>,
    unread: usize,
    loading: bool,
    revision: u64,
}

impl StoreState {
    fn summary(&self) -> StoreSummary {
        StoreSummary {
            revision: self.revision,
            total: self.notifications.len(),
            unread: self.unread,
            loading: self.loading,
        }
    }

    fn position(&self, id: &NotificationId) -> Option<usize> {
        self.notifications.iter().position(|n| &n.id == id)
    }

    fn recount(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }
}

/// Notification collection with a derived unread counter.
///
/// # Example
///
/// ```
/// use herald_core::data::{Notification, NotificationType};
/// use herald_engine::notifier::NotificationStore;
///
/// let store = NotificationStore::new();
/// let pushed = Notification::provisional("Quiz graded", "9/10", NotificationType::Success);
/// let id = pushed.id.clone();
///
/// store.insert_pushed(pushed);
/// assert_eq!(store.unread_count(), 1);
///
/// assert!(store.mark_read(&id));
/// assert!(!store.mark_read(&id));
/// assert_eq!(store.unread_count(), 0);
/// ```
#[derive(Debug)]
pub struct NotificationStore {
    state: RwLock<StoreState>,
    changes: watch::Sender<StoreSummary>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(StoreSummary::default());
        Self {
            state: RwLock::new(StoreState::default()),
            changes,
        }
    }

    /// Runs `op` under the write lock. `op` returns whether it changed
    /// anything; if so the revision moves and a summary is published.
    fn mutate<R>(&self, op: impl FnOnce(&mut StoreState) -> (bool, R)) -> R {
        let (summary, result) = {
            let mut state = self.state.write();
            let (changed, result) = op(&mut state);
            debug_assert_eq!(state.unread, state.recount());
            if !changed {
                return result;
            }
            state.revision += 1;
            (state.summary(), result)
        };
        self.changes.send_replace(summary);
        result
    }

    /// Replaces the whole collection with an authoritative listing.
    ///
    /// Order is kept as given. Provisional records not present in the
    /// listing are discarded.
    pub fn replace_all(&self, notifications: Vec<Notification>) {
        self.mutate(|state| {
            state.notifications = notifications;
            state.unread = state.recount();
            debug!(
                total = state.notifications.len(),
                unread = state.unread,
                "Store replaced"
            );
            (true, ())
        });
    }

    /// Inserts a pushed notification at the front.
    ///
    /// A record with the same id is replaced in place and the counter moves
    /// only by the difference in read state. Returns true if the record was
    /// new.
    pub fn insert_pushed(&self, notification: Notification) -> bool {
        self.mutate(|state| {
            if let Some(index) = state.position(&notification.id) {
                let was_unread = !state.notifications[index].is_read;
                let is_unread = !notification.is_read;
                match (was_unread, is_unread) {
                    (true, false) => state.unread = state.unread.saturating_sub(1),
                    (false, true) => state.unread += 1,
                    _ => {}
                }
                state.notifications[index] = notification;
                (true, false)
            } else {
                if !notification.is_read {
                    state.unread += 1;
                }
                state.notifications.insert(0, notification);
                (true, true)
            }
        })
    }

    /// Marks one record read. Returns true if it was present and unread.
    pub fn mark_read(&self, id: &NotificationId) -> bool {
        self.mutate(|state| {
            let Some(index) = state.position(id) else {
                return (false, false);
            };
            let record = &mut state.notifications[index];
            if record.is_read {
                return (false, false);
            }
            record.is_read = true;
            state.unread = state.unread.saturating_sub(1);
            (true, true)
        })
    }

    /// Marks every record read. Returns how many changed.
    pub fn mark_all_read(&self) -> usize {
        self.mutate(|state| {
            let mut changed = 0;
            for record in state.notifications.iter_mut().filter(|n| !n.is_read) {
                record.is_read = true;
                changed += 1;
            }
            state.unread = 0;
            (changed > 0, changed)
        })
    }

    /// Removes one record and returns it.
    pub fn remove(&self, id: &NotificationId) -> Option<Notification> {
        self.mutate(|state| {
            let Some(index) = state.position(id) else {
                return (false, None);
            };
            let removed = state.notifications.remove(index);
            if !removed.is_read {
                state.unread = state.unread.saturating_sub(1);
            }
            (true, Some(removed))
        })
    }

    /// Drops every record and resets the loading flag.
    pub fn clear(&self) {
        self.mutate(|state| {
            let changed = !state.notifications.is_empty() || state.loading;
            state.notifications.clear();
            state.unread = 0;
            state.loading = false;
            (changed, ())
        });
    }

    /// Sets the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.mutate(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            (changed, ())
        });
    }

    /// Copy of every record, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.state.read().notifications.clone()
    }

    /// Copy of one record.
    #[must_use]
    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        let state = self.state.read();
        state.position(id).map(|i| state.notifications[i].clone())
    }

    /// Number of unread records.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state.read().unread
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().notifications.len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().notifications.is_empty()
    }

    /// Whether an authoritative fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Current summary.
    #[must_use]
    pub fn summary(&self) -> StoreSummary {
        self.state.read().summary()
    }

    /// Watch channel of summaries, updated after every change.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<StoreSummary> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::data::NotificationType;

    fn record(id: &str, read: bool) -> Notification {
        Notification::new(NotificationId::new_unchecked(id), id, "body", NotificationType::Info)
            .with_read(read)
    }

    fn id(value: &str) -> NotificationId {
        NotificationId::new_unchecked(value)
    }

    fn assert_counter(store: &NotificationStore) {
        let unread = store.snapshot().iter().filter(|n| !n.is_read).count();
        assert_eq!(store.unread_count(), unread);
    }

    #[test]
    fn test_replace_all_keeps_order_and_counts() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("n1", true), record("n2", false)]);

        let ids: Vec<_> = store.snapshot().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![id("n1"), id("n2")]);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_insert_pushed_prepends() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("old", false)]);

        assert!(store.insert_pushed(record("new", false)));
        assert_eq!(store.snapshot()[0].id, id("new"));
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn test_insert_pushed_upserts_by_id() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("a", false), record("b", false)]);

        let mut updated = record("b", true);
        updated.title = "edited".to_string();
        assert!(!store.insert_pushed(updated));

        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot()[1].title, "edited");
        assert_eq!(store.unread_count(), 1);

        assert!(!store.insert_pushed(record("b", false)));
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("a", false)]);

        assert!(store.mark_read(&id("a")));
        assert!(!store.mark_read(&id("a")));
        assert!(!store.mark_read(&id("missing")));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_read() {
        let store = NotificationStore::new();
        let mut items: Vec<_> = (0..5).map(|i| record(&format!("u{i}"), false)).collect();
        items.push(record("r0", true));
        items.push(record("r1", true));
        store.replace_all(items);
        assert_eq!(store.unread_count(), 5);

        assert_eq!(store.mark_all_read(), 5);
        assert_eq!(store.unread_count(), 0);
        assert!(store.snapshot().iter().all(|n| n.is_read));
        assert_eq!(store.mark_all_read(), 0);
    }

    #[test]
    fn test_remove() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("a", false), record("b", true)]);

        assert_eq!(store.remove(&id("a")).map(|n| n.id), Some(id("a")));
        assert_eq!(store.unread_count(), 0);
        assert!(store.remove(&id("a")).is_none());
        assert!(store.remove(&id("b")).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_all_discards_provisional_pushes() {
        let store = NotificationStore::new();
        store.insert_pushed(Notification::provisional("t", "m", NotificationType::Info));
        store.insert_pushed(Notification::provisional("t", "m", NotificationType::Info));

        store.replace_all(vec![record("n1", false)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()[0].id, id("n1"));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_counter_matches_after_mixed_sequence() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("a", false), record("b", true), record("c", false)]);
        assert_counter(&store);

        let steps: Vec<Box<dyn Fn(&NotificationStore)>> = vec![
            Box::new(|s| {
                s.insert_pushed(record("d", false));
            }),
            Box::new(|s| {
                s.mark_read(&id("a"));
            }),
            Box::new(|s| {
                s.insert_pushed(record("a", false));
            }),
            Box::new(|s| {
                s.remove(&id("c"));
            }),
            Box::new(|s| {
                s.mark_read(&id("missing"));
            }),
            Box::new(|s| {
                s.insert_pushed(record("b", false));
            }),
            Box::new(|s| {
                s.mark_all_read();
            }),
            Box::new(|s| {
                s.insert_pushed(record("e", false));
            }),
            Box::new(|s| {
                s.remove(&id("e"));
            }),
            Box::new(|s| {
                s.remove(&id("e"));
            }),
        ];

        for step in steps {
            step(&store);
            assert_counter(&store);
        }
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_changes_track_revision() {
        let store = NotificationStore::new();
        let rx = store.changes();

        store.set_loading(true);
        assert!(rx.borrow().loading);

        store.replace_all(vec![record("a", false)]);
        store.set_loading(false);
        let summary = *rx.borrow();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.unread, 1);
        assert!(!summary.loading);
        assert_eq!(summary.revision, 3);

        // No-ops do not move the revision.
        store.mark_read(&id("missing"));
        store.set_loading(false);
        assert_eq!(rx.borrow().revision, 3);
    }

    #[test]
    fn test_clear() {
        let store = NotificationStore::new();
        store.replace_all(vec![record("a", false)]);
        store.set_loading(true);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
        assert!(!store.is_loading());
    }
}
