//! Per-event-kind fan-out of decoded server events.
//!
//! Consumers register against an [`EventKind`] and are invoked in
//! registration order, one after another, on the task that dispatches.
//! A consumer that returns an error or panics is logged and counted; the
//! remaining consumers still run.

mod consumers;

pub use consumers::{CallbackConsumer, ChannelConsumer};

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use herald_core::error::ConsumerError;
use herald_core::event::{EventKind, ServerEvent};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

/// Receives dispatched events.
///
/// Consumers run synchronously inside the dispatch loop, so they must not
/// block. Anything slow belongs on a spawned task or behind a channel.
pub trait EventConsumer: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &ServerEvent) -> Result<(), ConsumerError>;

    /// Returns the consumer name for logs.
    fn name(&self) -> &str;
}

/// Outcome of one [`EventDispatcher::dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Consumers that handled the event.
    pub delivered: usize,
    /// Consumers that failed or panicked.
    pub failed: usize,
}

/// Cumulative dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events dispatched.
    pub dispatched: u64,
    /// Successful consumer invocations.
    pub delivered: u64,
    /// Failed consumer invocations.
    pub failed: u64,
}

/// Subscription registry keyed by event kind.
#[derive(Default)]
pub struct EventDispatcher {
    registry: RwLock<HashMap<EventKind, Vec<Arc<dyn EventConsumer>>>>,
    dispatched: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `consumer` to the list for `kind`. Registering the same
    /// consumer twice makes it run twice.
    pub fn subscribe(&self, kind: EventKind, consumer: Arc<dyn EventConsumer>) {
        debug!(event = %kind, consumer = %consumer.name(), "Consumer subscribed");
        self.registry.write().entry(kind).or_default().push(consumer);
    }

    /// Subscribes `consumer` to each of `kinds`.
    pub fn subscribe_all(&self, kinds: &[EventKind], consumer: &Arc<dyn EventConsumer>) {
        for kind in kinds {
            self.subscribe(*kind, Arc::clone(consumer));
        }
    }

    /// Removes the first registration of `consumer` for `kind`.
    ///
    /// Returns false if it was not registered.
    pub fn unsubscribe(&self, kind: EventKind, consumer: &Arc<dyn EventConsumer>) -> bool {
        let mut registry = self.registry.write();
        let Some(consumers) = registry.get_mut(&kind) else {
            return false;
        };
        let Some(index) = consumers.iter().position(|c| Arc::ptr_eq(c, consumer)) else {
            return false;
        };
        consumers.remove(index);
        if consumers.is_empty() {
            registry.remove(&kind);
        }
        debug!(event = %kind, consumer = %consumer.name(), "Consumer unsubscribed");
        true
    }

    /// Removes one registration of `consumer` from each of `kinds`.
    pub fn unsubscribe_all(&self, kinds: &[EventKind], consumer: &Arc<dyn EventConsumer>) {
        for kind in kinds {
            self.unsubscribe(*kind, consumer);
        }
    }

    /// Delivers `event` to every consumer registered for its kind.
    ///
    /// The registry lock is released before any consumer runs, so consumers
    /// may subscribe or unsubscribe from inside `on_event`.
    pub fn dispatch(&self, event: &ServerEvent) -> DispatchReport {
        let kind = event.kind();
        let consumers: Vec<Arc<dyn EventConsumer>> = self
            .registry
            .read()
            .get(&kind)
            .map(|list| list.iter().map(Arc::clone).collect())
            .unwrap_or_default();

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let mut report = DispatchReport::default();

        for consumer in consumers {
            let outcome = catch_unwind(AssertUnwindSafe(|| consumer.on_event(event)))
                .unwrap_or_else(|payload| {
                    Err(ConsumerError::Panicked {
                        consumer: consumer.name().to_string(),
                        message: panic_message(payload.as_ref()),
                    })
                });

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        event = %kind,
                        consumer = %consumer.name(),
                        error = %e,
                        "Event consumer failed"
                    );
                }
            }
        }

        self.delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.failed.fetch_add(report.failed as u64, Ordering::Relaxed);

        debug!(
            event = %kind,
            delivered = report.delivered,
            failed = report.failed,
            "Event dispatched"
        );

        report
    }

    /// Drops every registration.
    pub fn clear(&self) {
        let removed: usize = {
            let mut registry = self.registry.write();
            let count = registry.values().map(Vec::len).sum();
            registry.clear();
            count
        };
        if removed > 0 {
            info!(registrations = removed, "Subscription registry cleared");
        }
    }

    /// Number of registrations for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry.read().get(&kind).map_or(0, Vec::len)
    }

    /// Total registrations across all kinds.
    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        self.registry.read().values().map(Vec::len).sum()
    }

    /// Returns cumulative counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriptions", &self.total_subscriptions())
            .field("stats", &self.stats())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::event::{EventBody, SystemAnnouncement};
    use parking_lot::Mutex;

    fn announcement() -> ServerEvent {
        ServerEvent::new(EventBody::SystemAnnouncement(SystemAnnouncement {
            title: Some("Maintenance".to_string()),
            message: None,
            level: None,
        }))
    }

    fn recorder(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn EventConsumer> {
        let log = Arc::clone(log);
        let label = name.to_string();
        Arc::new(CallbackConsumer::new(name, move |_| {
            log.lock().push(label.clone());
            Ok(())
        }))
    }

    #[test]
    fn test_registration_order() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b", "c"] {
            dispatcher.subscribe(EventKind::SystemAnnouncement, recorder(name, &log));
        }

        let report = dispatcher.dispatch(&announcement());
        assert_eq!(report.delivered, 3);
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_failing_consumer_is_isolated() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::SystemAnnouncement, recorder("first", &log));
        dispatcher.subscribe(
            EventKind::SystemAnnouncement,
            Arc::new(CallbackConsumer::new("broken", |_| {
                Err(ConsumerError::failed("broken", "boom"))
            })),
        );
        dispatcher.subscribe(EventKind::SystemAnnouncement, recorder("third", &log));

        let report = dispatcher.dispatch(&announcement());
        assert_eq!(report, DispatchReport { delivered: 2, failed: 1 });
        assert_eq!(*log.lock(), vec!["first", "third"]);
    }

    #[test]
    fn test_panicking_consumer_is_isolated() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::SystemAnnouncement, recorder("first", &log));
        dispatcher.subscribe(
            EventKind::SystemAnnouncement,
            Arc::new(CallbackConsumer::new("panics", |_| panic!("consumer bug"))),
        );
        dispatcher.subscribe(EventKind::SystemAnnouncement, recorder("third", &log));

        let report = dispatcher.dispatch(&announcement());
        assert_eq!(report.failed, 1);
        assert_eq!(*log.lock(), vec!["first", "third"]);
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[test]
    fn test_duplicate_registration_runs_twice() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let consumer = recorder("dup", &log);
        dispatcher.subscribe(EventKind::SystemAnnouncement, Arc::clone(&consumer));
        dispatcher.subscribe(EventKind::SystemAnnouncement, Arc::clone(&consumer));

        dispatcher.dispatch(&announcement());
        assert_eq!(log.lock().len(), 2);

        assert!(dispatcher.unsubscribe(EventKind::SystemAnnouncement, &consumer));
        dispatcher.dispatch(&announcement());
        assert_eq!(log.lock().len(), 3);
    }

    #[test]
    fn test_unsubscribe_missing_is_noop() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let consumer = recorder("x", &log);
        assert!(!dispatcher.unsubscribe(EventKind::QuizCompleted, &consumer));

        dispatcher.subscribe(EventKind::QuizCompleted, recorder("other", &log));
        assert!(!dispatcher.unsubscribe(EventKind::QuizCompleted, &consumer));
        assert_eq!(dispatcher.subscriber_count(EventKind::QuizCompleted), 1);
    }

    #[test]
    fn test_other_kinds_not_delivered() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.subscribe(EventKind::QuizCompleted, recorder("quiz", &log));

        let report = dispatcher.dispatch(&announcement());
        assert_eq!(report, DispatchReport::default());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_clear() {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let consumer = recorder("all", &log);
        dispatcher.subscribe_all(&EventKind::DOMAIN, &consumer);
        assert_eq!(dispatcher.total_subscriptions(), 9);

        dispatcher.clear();
        assert_eq!(dispatcher.total_subscriptions(), 0);
        dispatcher.dispatch(&announcement());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_consumer_may_unsubscribe_itself() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let slot: Arc<Mutex<Option<Arc<dyn EventConsumer>>>> = Arc::new(Mutex::new(None));
        let d = Arc::clone(&dispatcher);
        let s = Arc::clone(&slot);
        let consumer: Arc<dyn EventConsumer> = Arc::new(CallbackConsumer::new("once", move |_| {
            if let Some(me) = s.lock().take() {
                d.unsubscribe(EventKind::SystemAnnouncement, &me);
            }
            Ok(())
        }));
        *slot.lock() = Some(Arc::clone(&consumer));
        dispatcher.subscribe(EventKind::SystemAnnouncement, consumer);

        assert_eq!(dispatcher.dispatch(&announcement()).delivered, 1);
        assert_eq!(dispatcher.dispatch(&announcement()).delivered, 0);
    }
}
