//! Provider scopes and the public toast API.
//!
//! A [`ToastProvider`] owns one store and one scheduler. Callers reach it either
//! through the provider itself, through a clonable [`ToastHandle`], or through
//! [`use_toast`] from inside [`ToastProvider::scope`]. Scopes are fully
//! independent; nesting a scope shadows the outer one for the wrapped future.
//!
//! Lifecycle of a toast:
//!
//! ```text
//! show ──> entering ──(next tick)──> visible ──(duration | dismiss)──> leaving ──(exit delay)──> removed
//!              └───────────────────────(dismiss)──────────────────────┘
//! ```
//!
//! Capacity eviction removes the oldest entries at once, bypassing the
//! `leaving` phase and exit delay.

mod handle;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::config::ToastConfig;
use crate::error::{Result, ToastError};
use crate::metrics::{DismissReason, ToastMetrics};
use crate::notification::{Phase, Toast, ToastId, ToastInput};
use crate::scheduler::{TimerKind, ToastScheduler};
use crate::store::{ToastSnapshot, ToastStore};

pub use handle::{use_toast, ToastHandle};

/// Point-in-time counters for one scope
#[derive(Debug, Clone, Serialize)]
pub struct ToastStats {
    pub scope_id: Uuid,
    pub total: usize,
    pub entering: usize,
    pub visible: usize,
    pub leaving: usize,
    pub armed_timers: usize,
    /// Lifetime counters for this scope only
    pub shown_total: u64,
    pub dismissed_total: u64,
    pub evicted_total: u64,
    pub removed_total: u64,
}

#[derive(Debug, Default)]
struct ScopeCounters {
    shown: u64,
    dismissed: u64,
    evicted: u64,
    removed: u64,
}

struct ScopeState {
    store: ToastStore,
    scheduler: ToastScheduler,
    counters: ScopeCounters,
}

pub(crate) struct ScopeInner {
    id: Uuid,
    config: ToastConfig,
    closed: AtomicBool,
    state: Mutex<ScopeState>,
}

/// Owner of a toast scope.
///
/// Dropping the provider tears the scope down: every pending timer is canceled
/// and outstanding handles start failing with [`ToastError::ProviderGone`].
pub struct ToastProvider {
    inner: Arc<ScopeInner>,
}

impl ToastProvider {
    /// Create a scope on the current tokio runtime
    pub fn new(config: ToastConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ToastError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Create a scope whose timers run on `runtime`
    pub fn with_runtime(config: ToastConfig, runtime: Handle) -> Result<Self> {
        config.validate()?;

        let state = ScopeState {
            store: ToastStore::new(config.max_visible, config.order),
            scheduler: ToastScheduler::new(runtime),
            counters: ScopeCounters::default(),
        };
        let inner = Arc::new(ScopeInner {
            id: Uuid::new_v4(),
            config,
            closed: AtomicBool::new(false),
            state: Mutex::new(state),
        });

        tracing::info!(
            scope_id = %inner.id,
            position = ?inner.config.position,
            default_duration_ms = inner.config.default_duration_ms,
            max_visible = ?inner.config.max_visible,
            "Toast provider created"
        );

        Ok(Self { inner })
    }

    /// Show a toast and return its id for a later `dismiss`
    pub fn show(&self, input: impl Into<ToastInput>) -> ToastId {
        let toast = self.inner.new_toast(input.into());
        let id = toast.id;
        // The owner keeps the scope open, so the insert cannot be refused
        self.inner.insert(toast);
        id
    }

    /// Start the exit of a toast. Unknown or already leaving ids are ignored.
    pub fn dismiss(&self, id: ToastId) {
        self.inner.dismiss(id);
    }

    /// Send every toast that is not already leaving through the exit path
    pub fn dismiss_all(&self) -> usize {
        self.inner.dismiss_all()
    }

    /// Drop every toast immediately, skipping the exit delay
    pub fn clear(&self) -> usize {
        self.inner.clear()
    }

    pub fn handle(&self) -> ToastHandle {
        ToastHandle::new(Arc::downgrade(&self.inner))
    }

    /// Run `fut` with this scope installed as the current provider for [`use_toast`]
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        handle::CURRENT_PROVIDER.scope(self.handle(), fut).await
    }

    /// Synchronous variant of [`ToastProvider::scope`]
    pub fn scope_sync<R>(&self, f: impl FnOnce() -> R) -> R {
        handle::CURRENT_PROVIDER.sync_scope(self.handle(), f)
    }

    pub fn toasts(&self) -> ToastSnapshot {
        self.inner.lock().store.snapshot()
    }

    pub fn get(&self, id: ToastId) -> Option<Toast> {
        self.inner.lock().store.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().store.is_empty()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ToastSnapshot> {
        self.inner.lock().store.subscribe()
    }

    /// Stream of snapshots, starting with the current one
    pub fn updates(&self) -> WatchStream<ToastSnapshot> {
        WatchStream::new(self.subscribe())
    }

    pub fn stats(&self) -> ToastStats {
        self.inner.stats()
    }

    pub fn config(&self) -> &ToastConfig {
        &self.inner.config
    }

    pub fn scope_id(&self) -> Uuid {
        self.inner.id
    }

    /// Tear the scope down, returning how many pending timers were canceled
    pub fn shutdown(self) -> usize {
        self.inner.close()
    }
}

impl Drop for ToastProvider {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl ScopeInner {
    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn new_toast(&self, input: ToastInput) -> Toast {
        Toast::from_input(input, self.config.default_duration())
    }

    /// Insert a toast and arm its auto-dismiss timer.
    ///
    /// Returns `false` without touching the store once the scope is closed.
    pub(crate) fn insert(self: &Arc<Self>, toast: Toast) -> bool {
        let id = toast.id;
        let variant = toast.variant;
        let duration = toast.duration;
        let deadline = deadline_after(duration);

        let mut state = self.lock();
        if self.is_closed() {
            tracing::trace!(scope_id = %self.id, toast_id = %id, "Show ignored, scope closed");
            return false;
        }

        let evicted = state.store.insert(toast);
        for oldest in &evicted {
            if state.scheduler.cancel(oldest.id).is_some() {
                ToastMetrics::timers_canceled(1);
            }
            tracing::debug!(
                scope_id = %self.id,
                toast_id = %oldest.id,
                phase = ?oldest.phase,
                "Evicted oldest toast over capacity"
            );
        }
        ToastMetrics::shown();
        ToastMetrics::evicted(evicted.len());
        state.counters.shown += 1;
        state.counters.evicted += evicted.len() as u64;

        state
            .scheduler
            .arm(id, TimerKind::AutoDismiss, auto_dismiss(Arc::downgrade(self), id, deadline));
        state.store.publish();

        tracing::debug!(
            scope_id = %self.id,
            toast_id = %id,
            variant = ?variant,
            duration_ms = duration.as_millis() as u64,
            total = state.store.len(),
            "Toast shown"
        );

        true
    }

    pub(crate) fn dismiss(self: &Arc<Self>, id: ToastId) {
        let mut state = self.lock();
        match state.store.get(id) {
            Some(toast) if !toast.is_leaving() => {}
            Some(_) => {
                tracing::trace!(toast_id = %id, "Dismiss ignored, toast already leaving");
                return;
            }
            None => {
                tracing::trace!(toast_id = %id, "Dismiss ignored, unknown toast");
                return;
            }
        }

        if state.scheduler.cancel(id).is_some() {
            ToastMetrics::timers_canceled(1);
        }
        if self.begin_leaving(&mut state, id, DismissReason::Manual) {
            state.store.publish();
        }
    }

    fn dismiss_all(self: &Arc<Self>) -> usize {
        let mut state = self.lock();
        let ids = state.store.active_ids();
        let mut dismissed = 0;
        for id in ids {
            if state.scheduler.cancel(id).is_some() {
                ToastMetrics::timers_canceled(1);
            }
            if self.begin_leaving(&mut state, id, DismissReason::Manual) {
                dismissed += 1;
            }
        }
        if dismissed > 0 {
            state.store.publish();
        }
        dismissed
    }

    fn clear(&self) -> usize {
        let mut state = self.lock();
        ToastMetrics::timers_canceled(state.scheduler.cancel_all());
        let removed = state.store.clear().len();
        ToastMetrics::discarded(removed);
        state.store.publish();
        tracing::debug!(scope_id = %self.id, removed = removed, "Toasts cleared");
        removed
    }

    /// Entering toasts become visible on the first tick after `show`
    fn enter(&self, id: ToastId) {
        if self.is_closed() {
            return;
        }
        let mut state = self.lock();
        if state.store.mark_visible(id) {
            state.store.publish();
        }
    }

    /// Auto-dismiss timer fired
    fn expire(self: &Arc<Self>, id: ToastId) {
        if self.is_closed() {
            return;
        }
        let mut state = self.lock();
        if !state.scheduler.disarm(id, TimerKind::AutoDismiss) {
            tracing::trace!(toast_id = %id, "Stale auto-dismiss timer ignored");
            return;
        }
        if self.begin_leaving(&mut state, id, DismissReason::Auto) {
            state.store.publish();
        }
    }

    /// Exit delay elapsed
    fn finish_exit(&self, id: ToastId) {
        if self.is_closed() {
            return;
        }
        let mut state = self.lock();
        if !state.scheduler.disarm(id, TimerKind::Exit) {
            return;
        }
        if state.store.remove(id).is_some() {
            ToastMetrics::removed();
            state.counters.removed += 1;
            state.store.publish();
            tracing::debug!(scope_id = %self.id, toast_id = %id, "Toast removed");
        }
    }

    /// Move `id` to leaving and arm its exit timer. Caller publishes.
    fn begin_leaving(self: &Arc<Self>, state: &mut ScopeState, id: ToastId, reason: DismissReason) -> bool {
        if !state.store.mark_leaving(id) {
            return false;
        }
        ToastMetrics::dismissed(reason);
        state.counters.dismissed += 1;

        let deadline = deadline_after(self.config.exit_delay());
        state
            .scheduler
            .arm(id, TimerKind::Exit, exit_after_delay(Arc::downgrade(self), id, deadline));

        tracing::debug!(
            scope_id = %self.id,
            toast_id = %id,
            reason = reason.as_str(),
            "Toast leaving"
        );
        true
    }

    fn stats(&self) -> ToastStats {
        let state = self.lock();
        ToastStats {
            scope_id: self.id,
            total: state.store.len(),
            entering: state.store.count_in(Phase::Entering),
            visible: state.store.count_in(Phase::Visible),
            leaving: state.store.count_in(Phase::Leaving),
            armed_timers: state.scheduler.armed_count(),
            shown_total: state.counters.shown,
            dismissed_total: state.counters.dismissed,
            evicted_total: state.counters.evicted,
            removed_total: state.counters.removed,
        }
    }

    fn close(&self) -> usize {
        if self.closed.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let mut state = self.lock();
        let canceled = state.scheduler.cancel_all();
        let discarded = state.store.clear().len();
        ToastMetrics::timers_canceled(canceled);
        ToastMetrics::discarded(discarded);
        state.store.publish();

        tracing::info!(
            scope_id = %self.id,
            canceled_timers = canceled,
            discarded_toasts = discarded,
            "Toast provider shut down"
        );
        canceled
    }
}

/// `None` when `delay` reaches past the clock's range; such a timer never fires.
fn deadline_after(delay: Duration) -> Option<Instant> {
    Instant::now().checked_add(delay)
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn auto_dismiss(scope: Weak<ScopeInner>, id: ToastId, deadline: Option<Instant>) {
    tokio::task::yield_now().await;
    match scope.upgrade() {
        Some(scope) => scope.enter(id),
        None => return,
    }

    sleep_until(deadline).await;
    if let Some(scope) = scope.upgrade() {
        scope.expire(id);
    }
}

async fn exit_after_delay(scope: Weak<ScopeInner>, id: ToastId, deadline: Option<Instant>) {
    sleep_until(deadline).await;
    if let Some(scope) = scope.upgrade() {
        scope.finish_exit(id);
    }
}
