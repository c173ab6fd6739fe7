//! Shared API object for a provider scope.

use std::sync::{Arc, Weak};

use tokio::sync::watch;

use crate::error::{Result, ToastError};
use crate::notification::{ToastId, ToastInput};
use crate::store::ToastSnapshot;

use super::ScopeInner;

tokio::task_local! {
    pub(super) static CURRENT_PROVIDER: ToastHandle;
}

/// Get the toast API of the enclosing [`ToastProvider::scope`](super::ToastProvider::scope).
///
/// Fails with [`ToastError::NoProvider`] when called outside any scope. This is
/// an integration bug and should not be retried.
pub fn use_toast() -> Result<ToastHandle> {
    CURRENT_PROVIDER
        .try_with(ToastHandle::clone)
        .map_err(|_| ToastError::NoProvider)
}

/// Clonable handle exposing `show` and `dismiss` for one scope.
///
/// The handle does not keep the scope alive.
#[derive(Clone)]
pub struct ToastHandle {
    scope: Weak<ScopeInner>,
}

impl ToastHandle {
    pub(super) fn new(scope: Weak<ScopeInner>) -> Self {
        Self { scope }
    }

    fn scope(&self) -> Result<Arc<ScopeInner>> {
        self.scope
            .upgrade()
            .filter(|scope| !scope.is_closed())
            .ok_or(ToastError::ProviderGone)
    }

    pub fn show(&self, input: impl Into<ToastInput>) -> Result<ToastId> {
        let scope = self.scope()?;
        let toast = scope.new_toast(input.into());
        let id = toast.id;
        // The scope may close between the upgrade and the insert
        if scope.insert(toast) {
            Ok(id)
        } else {
            Err(ToastError::ProviderGone)
        }
    }

    pub fn dismiss(&self, id: ToastId) -> Result<()> {
        self.scope()?.dismiss(id);
        Ok(())
    }

    pub fn subscribe(&self) -> Result<watch::Receiver<ToastSnapshot>> {
        Ok(self.scope()?.lock().store.subscribe())
    }

    /// Whether the owning provider is still alive
    pub fn is_active(&self) -> bool {
        self.scope().is_ok()
    }
}

impl std::fmt::Debug for ToastHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToastConfig;
    use crate::provider::ToastProvider;

    #[test]
    fn test_use_toast_outside_scope_fails() {
        let err = use_toast().unwrap_err();
        assert!(matches!(err, ToastError::NoProvider));
        assert!(err.is_usage_error());
    }

    #[tokio::test]
    async fn test_use_toast_inside_scope() {
        let provider = ToastProvider::new(ToastConfig::default()).unwrap();
        let id = provider
            .scope(async { use_toast().unwrap().show("inside").unwrap() })
            .await;
        assert_eq!(provider.get(id).unwrap().message, "inside");
    }

    #[tokio::test]
    async fn test_scope_sync() {
        let provider = ToastProvider::new(ToastConfig::default()).unwrap();
        let id = provider.scope_sync(|| use_toast().unwrap().show("sync").unwrap());
        assert!(provider.get(id).is_some());
    }

    #[tokio::test]
    async fn test_handle_fails_after_drop() {
        let provider = ToastProvider::new(ToastConfig::default()).unwrap();
        let handle = provider.handle();
        assert!(handle.is_active());

        drop(provider);
        assert!(!handle.is_active());
        assert!(matches!(handle.show("late"), Err(ToastError::ProviderGone)));
        assert!(matches!(handle.dismiss(ToastId::new()), Err(ToastError::ProviderGone)));
    }
}
