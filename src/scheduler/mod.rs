//! Per-toast timers.
//!
//! Each live toast owns at most one armed timer: the auto-dismiss countdown
//! while it is shown, then the exit delay once it is leaving. Timers are
//! spawned tokio tasks keyed by toast id. A firing timer must claim its slot
//! with [`ToastScheduler::disarm`] before acting, so a timer that was canceled
//! or replaced while it was waiting on the scope lock does nothing.

use std::collections::HashMap;
use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::notification::ToastId;

/// What an armed timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Moves the toast to `leaving` after its duration
    AutoDismiss,
    /// Removes a leaving toast after the exit delay
    Exit,
}

struct ArmedTimer {
    kind: TimerKind,
    handle: JoinHandle<()>,
}

pub struct ToastScheduler {
    runtime: Handle,
    timers: HashMap<ToastId, ArmedTimer>,
}

impl ToastScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            timers: HashMap::new(),
        }
    }

    /// Spawn `task` as the timer for `id`, aborting any timer it replaces
    pub fn arm<F>(&mut self, id: ToastId, kind: TimerKind, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(task);
        if let Some(previous) = self.timers.insert(id, ArmedTimer { kind, handle }) {
            previous.handle.abort();
            tracing::trace!(toast_id = %id, replaced = ?previous.kind, "Replaced armed timer");
        }
        tracing::trace!(toast_id = %id, kind = ?kind, "Timer armed");
    }

    /// Claim the slot for a firing timer.
    ///
    /// Returns false when the timer of that kind is no longer armed for `id`.
    pub fn disarm(&mut self, id: ToastId, kind: TimerKind) -> bool {
        match self.timers.get(&id) {
            Some(armed) if armed.kind == kind => {
                self.timers.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Cancel the timer for `id`, returning the kind that was armed
    pub fn cancel(&mut self, id: ToastId) -> Option<TimerKind> {
        let armed = self.timers.remove(&id)?;
        armed.handle.abort();
        tracing::trace!(toast_id = %id, kind = ?armed.kind, "Timer canceled");
        Some(armed.kind)
    }

    /// Cancel every outstanding timer, returning how many were armed
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        for (_, armed) in self.timers.drain() {
            armed.handle.abort();
        }
        count
    }

    pub fn armed_kind(&self, id: ToastId) -> Option<TimerKind> {
        self.timers.get(&id).map(|armed| armed.kind)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for ToastScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
