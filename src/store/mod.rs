//! Ordered collection of live toasts.
//!
//! The store is the single owner of toast lifecycle state. Entries are kept in
//! insertion order; `StackOrder` only affects the published snapshot. When a
//! capacity bound is set, inserting past it drops entries from the oldest end
//! and the newest entry is always admitted.

use std::collections::VecDeque;

use tokio::sync::watch;

use crate::notification::{Phase, StackOrder, Toast, ToastId};

/// Snapshot of the store, in display order
pub type ToastSnapshot = Vec<Toast>;

pub struct ToastStore {
    /// Live toasts, oldest first
    entries: VecDeque<Toast>,
    max_visible: Option<usize>,
    order: StackOrder,
    publisher: watch::Sender<ToastSnapshot>,
}

impl ToastStore {
    pub fn new(max_visible: Option<usize>, order: StackOrder) -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self {
            entries: VecDeque::new(),
            max_visible,
            order,
            publisher,
        }
    }

    /// Append a toast, returning whatever had to be evicted to stay within bounds
    pub fn insert(&mut self, toast: Toast) -> Vec<Toast> {
        self.entries.push_back(toast);

        let mut evicted = Vec::new();
        if let Some(max) = self.max_visible {
            while self.entries.len() > max {
                match self.entries.pop_front() {
                    Some(oldest) => evicted.push(oldest),
                    None => break,
                }
            }
        }
        evicted
    }

    /// `entering -> visible`. Returns false if the toast is gone or past entering.
    pub fn mark_visible(&mut self, id: ToastId) -> bool {
        match self.get_mut(id) {
            Some(toast) if toast.phase == Phase::Entering => {
                toast.phase = Phase::Visible;
                true
            }
            _ => false,
        }
    }

    /// Move a toast to `leaving`. Returns false if it is gone or already leaving.
    pub fn mark_leaving(&mut self, id: ToastId) -> bool {
        match self.get_mut(id) {
            Some(toast) if toast.phase != Phase::Leaving => {
                toast.phase = Phase::Leaving;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: ToastId) -> Option<Toast> {
        let pos = self.entries.iter().position(|t| t.id == id)?;
        self.entries.remove(pos)
    }

    /// Drop every entry, returning their ids
    pub fn clear(&mut self) -> Vec<ToastId> {
        self.entries.drain(..).map(|t| t.id).collect()
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.entries.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: ToastId) -> Option<&mut Toast> {
        self.entries.iter_mut().find(|t| t.id == id)
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of toasts that are not leaving yet, oldest first
    pub fn active_ids(&self) -> Vec<ToastId> {
        self.entries
            .iter()
            .filter(|t| !t.is_leaving())
            .map(|t| t.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_in(&self, phase: Phase) -> usize {
        self.entries.iter().filter(|t| t.phase == phase).count()
    }

    pub fn snapshot(&self) -> ToastSnapshot {
        match self.order {
            StackOrder::OldestFirst => self.entries.iter().cloned().collect(),
            StackOrder::NewestFirst => self.entries.iter().rev().cloned().collect(),
        }
    }

    /// Push the current snapshot to every observer
    pub fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }

    pub fn subscribe(&self) -> watch::Receiver<ToastSnapshot> {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::ToastInput;
    use std::time::Duration;

    fn toast(message: &str) -> Toast {
        Toast::from_input(ToastInput::new(message), Duration::from_millis(3500))
    }

    fn messages(store: &ToastStore) -> Vec<String> {
        store.snapshot().into_iter().map(|t| t.message).collect()
    }

    #[test]
    fn test_insert_keeps_insertion_order() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        store.insert(toast("a"));
        store.insert(toast("b"));
        store.insert(toast("c"));
        assert_eq!(messages(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_newest_first_reverses_snapshot_only() {
        let mut store = ToastStore::new(Some(2), StackOrder::NewestFirst);
        store.insert(toast("a"));
        store.insert(toast("b"));
        let evicted = store.insert(toast("c"));
        assert_eq!(messages(&store), vec!["c", "b"]);
        assert_eq!(evicted[0].message, "a");
    }

    #[test]
    fn test_insert_evicts_oldest_past_capacity() {
        let mut store = ToastStore::new(Some(3), StackOrder::OldestFirst);
        for m in ["a", "b", "c"] {
            assert!(store.insert(toast(m)).is_empty());
        }
        let evicted = store.insert(toast("d"));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].message, "a");
        assert_eq!(messages(&store), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_capacity_one_replaces_previous() {
        let mut store = ToastStore::new(Some(1), StackOrder::OldestFirst);
        store.insert(toast("first"));
        store.insert(toast("second"));
        assert_eq!(messages(&store), vec!["second"]);
    }

    #[test]
    fn test_phase_transitions() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        let t = toast("a");
        let id = t.id;
        store.insert(t);

        assert!(store.mark_visible(id));
        assert!(!store.mark_visible(id));
        assert_eq!(store.get(id).unwrap().phase, Phase::Visible);

        assert!(store.mark_leaving(id));
        assert!(!store.mark_leaving(id));
        assert!(!store.mark_visible(id));
        assert_eq!(store.count_in(Phase::Leaving), 1);
        assert!(store.active_ids().is_empty());
    }

    #[test]
    fn test_entering_can_leave_directly() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        let t = toast("a");
        let id = t.id;
        store.insert(t);
        assert!(store.mark_leaving(id));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        store.insert(toast("a"));
        let unknown = ToastId::new();
        assert!(!store.mark_leaving(unknown));
        assert!(store.remove(unknown).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order_of_rest() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        let b = toast("b");
        let b_id = b.id;
        store.insert(toast("a"));
        store.insert(b);
        store.insert(toast("c"));
        assert_eq!(store.remove(b_id).map(|t| t.message), Some("b".to_string()));
        assert_eq!(messages(&store), vec!["a", "c"]);
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        store.insert(toast("a"));
        store.publish();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn test_clear_returns_ids() {
        let mut store = ToastStore::new(None, StackOrder::OldestFirst);
        store.insert(toast("a"));
        store.insert(toast("b"));
        assert_eq!(store.clear().len(), 2);
        assert!(store.is_empty());
    }
}
