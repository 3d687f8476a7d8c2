//! Session-scoped orchestration of the event channel, the REST API and the
//! notification store.
//!
//! One [`NotificationCoordinator`] serves one signed-in user at a time.
//! `start_session` wires a consumer into the dispatcher, opens the event
//! channel and loads the authoritative listing. Pushes are applied to the
//! store optimistically and a reconciliation fetch follows shortly after,
//! so provisional records are eventually replaced by server rows.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use herald_core::data::Notification;
use herald_core::error::{ApiError, ConnectionError, ConsumerError, HeraldError};
use herald_core::event::{ConnectionStatus, EventBody, EventKind, ServerEvent};
use herald_core::types::NotificationId;
use herald_gateway::dispatch::{EventConsumer, EventDispatcher};
use herald_gateway::rest::{NotificationApi, RestNotificationApi, SessionProvider};
use herald_gateway::transport;
use herald_gateway::ws::{ConnectionManager, ConnectionState};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::mapping::to_notification;
use super::session::{SessionGuard, SessionTracker};
use super::store::NotificationStore;
use super::surface::{NotificationSurface, present_all};
use crate::config::{HeraldConfig, SyncConfig};

const SIGNAL_CAPACITY: usize = 32;
const DEFAULT_PAGE_SIZE: u32 = 50;

/// Why a reconciliation fetch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Initial,
    Push,
    Reconnect,
    Periodic,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initial => "initial",
            Self::Push => "push",
            Self::Reconnect => "reconnect",
            Self::Periodic => "periodic",
            Self::Manual => "manual",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncSignal {
    Pushed,
    Reconnected,
}

struct Inner {
    store: Arc<NotificationStore>,
    api: Arc<dyn NotificationApi>,
    connection: Arc<ConnectionManager>,
    surfaces: Vec<Arc<dyn NotificationSurface>>,
    sync: SyncConfig,
    page_size: u32,
    sessions: SessionTracker,
    fetches: Mutex<InFlight>,
}

/// In-flight fetch count of one session generation.
#[derive(Debug, Default)]
struct InFlight {
    generation: u64,
    count: usize,
}

struct ActiveSession {
    guard: SessionGuard,
    consumer: Arc<dyn EventConsumer>,
    worker: JoinHandle<()>,
}

/// Keeps the notification store in step with the server for one session
/// at a time.
pub struct NotificationCoordinator {
    inner: Arc<Inner>,
    active: Mutex<Option<ActiveSession>>,
}

fn session_kinds() -> Vec<EventKind> {
    EventKind::DOMAIN
        .iter()
        .chain(EventKind::CONNECTION.iter())
        .copied()
        .collect()
}

impl NotificationCoordinator {
    /// Creates a coordinator without presentation surfaces.
    #[must_use]
    pub fn new(
        connection: Arc<ConnectionManager>,
        api: Arc<dyn NotificationApi>,
        sync: SyncConfig,
    ) -> Self {
        Self::from_parts(connection, api, sync, DEFAULT_PAGE_SIZE, Vec::new())
    }

    fn from_parts(
        connection: Arc<ConnectionManager>,
        api: Arc<dyn NotificationApi>,
        sync: SyncConfig,
        page_size: u32,
        surfaces: Vec<Arc<dyn NotificationSurface>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Arc::new(NotificationStore::new()),
                api,
                connection,
                surfaces,
                sync,
                page_size,
                sessions: SessionTracker::new(),
                fetches: Mutex::new(InFlight::default()),
            }),
            active: Mutex::new(None),
        }
    }

    /// Wires the WebSocket transport, the REST client and the connection
    /// manager described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a transport or HTTP client cannot be built.
    pub fn from_config(
        config: &HeraldConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, HeraldError> {
        let transport = transport::from_config(&config.connection)?;
        let connection = ConnectionManager::new(
            config.connection.clone(),
            transport,
            Arc::new(EventDispatcher::new()),
        );
        let api = RestNotificationApi::new(config.api.clone(), session)?;
        Ok(Self::from_parts(
            Arc::new(connection),
            Arc::new(api),
            config.sync,
            config.api.page_size,
            Vec::new(),
        ))
    }

    /// Adds a presentation surface. Must be called before the first session.
    #[must_use]
    pub fn with_surface(mut self, surface: Arc<dyn NotificationSurface>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.surfaces.push(surface),
            None => warn!(surface = surface.name(), "Surface added after start, ignored"),
        }
        self
    }

    /// Sets the page size of authoritative fetches.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.page_size = page_size.max(1);
        }
        self
    }

    /// Starts a session for `credential`.
    ///
    /// Any running session is ended first. Subscribes to every domain and
    /// connection event kind, opens the event channel and awaits the
    /// initial authoritative fetch. A failed fetch is logged and leaves the
    /// store empty; the channel stays up.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::NoCredential` for an empty credential.
    pub async fn start_session(&self, credential: &str) -> Result<(), ConnectionError> {
        if credential.trim().is_empty() {
            return Err(ConnectionError::NoCredential);
        }
        if self.is_active() {
            self.end_session().await;
        }

        let guard = self.inner.sessions.begin();
        let (signals, signal_rx) = mpsc::channel(SIGNAL_CAPACITY);
        let consumer: Arc<dyn EventConsumer> = Arc::new(SessionConsumer {
            store: Arc::clone(&self.inner.store),
            surfaces: self.inner.surfaces.clone(),
            guard: guard.clone(),
            signals,
            was_connected: AtomicBool::new(false),
            lost: AtomicBool::new(false),
        });

        let kinds = session_kinds();
        let dispatcher = self.inner.connection.dispatcher();
        dispatcher.subscribe_all(&kinds, &consumer);

        if let Err(e) = self.inner.connection.connect(credential) {
            dispatcher.unsubscribe_all(&kinds, &consumer);
            guard.cancel();
            return Err(e);
        }

        let worker = tokio::spawn(sync_loop(Arc::clone(&self.inner), guard.clone(), signal_rx));
        let previous = self.active.lock().replace(ActiveSession {
            guard: guard.clone(),
            consumer,
            worker,
        });
        if let Some(previous) = previous {
            previous.guard.cancel();
            dispatcher.unsubscribe_all(&kinds, &previous.consumer);
        }
        info!(generation = guard.generation(), "Session started");

        self.inner.reconcile(&guard, Trigger::Initial).await;
        Ok(())
    }

    /// Ends the current session: cancels pending work, unsubscribes,
    /// closes the event channel and clears the store. Idempotent.
    pub async fn end_session(&self) {
        let Some(active) = self.active.lock().take() else {
            debug!("No active session to end");
            return;
        };

        active.guard.cancel();
        self.inner.sessions.invalidate();
        self.inner
            .connection
            .dispatcher()
            .unsubscribe_all(&session_kinds(), &active.consumer);
        self.inner.store.clear();
        self.inner.connection.disconnect().await;

        if let Err(e) = active.worker.await
            && e.is_panic()
        {
            warn!(error = %e, "Sync worker panicked");
        }
        info!(generation = active.guard.generation(), "Session ended");
    }

    /// Marks one notification read, on the server first.
    ///
    /// Provisional records are unknown to the server and only change
    /// locally. Returns whether the store changed.
    ///
    /// # Errors
    ///
    /// Returns the API error, or `ApiError::SessionEnded` when no session
    /// is active or it ended while the call was in flight. The store is
    /// untouched on error.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<bool, ApiError> {
        let guard = self.current_guard()?;
        if self.inner.is_server_known(id) {
            self.inner
                .api
                .mark_read(id)
                .await
                .inspect_err(|e| warn!(id = %id, error = %e, "Mark read failed"))?;
        }
        ensure_current(&guard, "mark_read")?;
        Ok(self.inner.store.mark_read(id))
    }

    /// Marks every notification read. Returns how many records changed.
    ///
    /// # Errors
    ///
    /// Same as [`NotificationCoordinator::mark_read`].
    pub async fn mark_all_read(&self) -> Result<usize, ApiError> {
        let guard = self.current_guard()?;
        self.inner
            .api
            .mark_all_read()
            .await
            .inspect_err(|e| warn!(error = %e, "Mark all read failed"))?;
        ensure_current(&guard, "mark_all_read")?;
        Ok(self.inner.store.mark_all_read())
    }

    /// Deletes one notification. Returns the removed record.
    ///
    /// # Errors
    ///
    /// Same as [`NotificationCoordinator::mark_read`].
    pub async fn delete(&self, id: &NotificationId) -> Result<Option<Notification>, ApiError> {
        let guard = self.current_guard()?;
        if self.inner.is_server_known(id) {
            self.inner
                .api
                .delete(id)
                .await
                .inspect_err(|e| warn!(id = %id, error = %e, "Delete failed"))?;
        }
        ensure_current(&guard, "delete")?;
        Ok(self.inner.store.remove(id))
    }

    /// Reloads the authoritative listing now.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionEnded` when no session is active. Fetch
    /// failures are logged, not returned.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let guard = self.current_guard()?;
        self.inner.reconcile(&guard, Trigger::Manual).await;
        Ok(())
    }

    /// The notification store.
    #[must_use]
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.inner.store
    }

    /// The connection manager.
    #[must_use]
    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.inner.connection
    }

    /// Current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Watch channel of connection states.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe_state()
    }

    /// Returns true while a session is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    fn current_guard(&self) -> Result<SessionGuard, ApiError> {
        self.active
            .lock()
            .as_ref()
            .map(|active| active.guard.clone())
            .filter(SessionGuard::is_current)
            .ok_or(ApiError::SessionEnded)
    }
}

impl Drop for NotificationCoordinator {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.guard.cancel();
            active.worker.abort();
        }
    }
}

impl fmt::Debug for NotificationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCoordinator")
            .field("active", &self.is_active())
            .field("connection", &self.inner.connection.state())
            .field("store", &self.inner.store.summary())
            .finish_non_exhaustive()
    }
}

fn ensure_current(guard: &SessionGuard, operation: &'static str) -> Result<(), ApiError> {
    if guard.is_current() {
        Ok(())
    } else {
        debug!(operation, generation = guard.generation(), "Dropping late response");
        Err(ApiError::SessionEnded)
    }
}

impl Inner {
    fn is_server_known(&self, id: &NotificationId) -> bool {
        self.store
            .get(id)
            .map_or(!id.is_client_minted(), |n| !n.provisional)
    }

    fn begin_fetch(&self, generation: u64) {
        let mut fetches = self.fetches.lock();
        if fetches.generation != generation {
            *fetches = InFlight {
                generation,
                count: 0,
            };
        }
        fetches.count += 1;
        if fetches.count == 1 {
            self.store.set_loading(true);
        }
    }

    fn finish_fetch(&self, generation: u64) {
        let mut fetches = self.fetches.lock();
        if fetches.generation != generation {
            return;
        }
        fetches.count = fetches.count.saturating_sub(1);
        if fetches.count == 0 {
            self.store.set_loading(false);
        }
    }

    async fn reconcile(&self, guard: &SessionGuard, trigger: Trigger) {
        if !guard.is_current() {
            return;
        }
        let generation = guard.generation();
        self.begin_fetch(generation);
        let result = tokio::select! {
            () = guard.cancelled() => None,
            result = self.api.list(1, self.page_size) => Some(result),
        };
        self.finish_fetch(generation);

        match result {
            Some(result) if guard.is_current() => match result {
                Ok(page) => {
                    debug!(%trigger, items = page.items.len(), "Reconciled with server");
                    self.store.replace_all(page.items);
                }
                Err(e) => warn!(%trigger, error = %e, "Notification fetch failed"),
            },
            Some(_) => debug!(%trigger, generation, "Dropping late fetch result"),
            None => debug!(%trigger, generation, "Fetch abandoned"),
        }
    }
}

async fn sync_loop(inner: Arc<Inner>, guard: SessionGuard, mut signals: mpsc::Receiver<SyncSignal>) {
    let period = inner.sync.reconcile_interval;
    let mut periodic = tokio::time::interval_at(Instant::now() + period, period);
    periodic.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut debounce: Option<Instant> = None;

    loop {
        let pending_push = async move {
            match debounce {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            () = guard.cancelled() => break,

            signal = signals.recv() => match signal {
                Some(SyncSignal::Pushed) => {
                    debounce = Some(Instant::now() + inner.sync.push_debounce);
                }
                Some(SyncSignal::Reconnected) => {
                    debounce = None;
                    inner.reconcile(&guard, Trigger::Reconnect).await;
                }
                None => break,
            },

            () = pending_push => {
                debounce = None;
                inner.reconcile(&guard, Trigger::Push).await;
            }

            _ = periodic.tick() => {
                inner.reconcile(&guard, Trigger::Periodic).await;
            }
        }
    }
    debug!(generation = guard.generation(), "Sync worker stopped");
}

/// Dispatcher consumer registered for the lifetime of one session.
struct SessionConsumer {
    store: Arc<NotificationStore>,
    surfaces: Vec<Arc<dyn NotificationSurface>>,
    guard: SessionGuard,
    signals: mpsc::Sender<SyncSignal>,
    was_connected: AtomicBool,
    lost: AtomicBool,
}

impl SessionConsumer {
    fn signal(&self, signal: SyncSignal) -> Result<(), ConsumerError> {
        match self.signals.try_send(signal) {
            // A full queue already holds a pending reconciliation.
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ConsumerError::ChannelClosed {
                consumer: self.name().to_string(),
            }),
        }
    }

    fn on_status(&self, status: &ConnectionStatus) -> Result<(), ConsumerError> {
        if status.connected {
            self.was_connected.store(true, Ordering::Release);
            if self.lost.swap(false, Ordering::AcqRel) {
                info!("Event channel restored");
                return self.signal(SyncSignal::Reconnected);
            }
        } else if self.was_connected.load(Ordering::Acquire) {
            self.lost.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn on_push(&self, event: &ServerEvent) -> Result<(), ConsumerError> {
        let Some(notification) = to_notification(event) else {
            return Ok(());
        };
        debug!(
            event = event.kind().wire_name(),
            id = %notification.id,
            provisional = notification.provisional,
            "Applying push"
        );

        let unread = !notification.is_read;
        let snapshot = (!self.surfaces.is_empty()).then(|| notification.clone());
        if self.store.insert_pushed(notification)
            && unread
            && let Some(snapshot) = snapshot
        {
            present_all(&self.surfaces, &snapshot);
        }
        self.signal(SyncSignal::Pushed)
    }
}

impl EventConsumer for SessionConsumer {
    fn on_event(&self, event: &ServerEvent) -> Result<(), ConsumerError> {
        if !self.guard.is_current() {
            return Ok(());
        }
        match &event.body {
            EventBody::ConnectionStatus(status) => self.on_status(status),
            EventBody::ConnectionError(e) => {
                warn!(attempts = e.attempts, reason = %e.reason, "Event channel gave up");
                Ok(())
            }
            _ => self.on_push(event),
        }
    }

    fn name(&self) -> &str {
        "notification-coordinator"
    }
}
