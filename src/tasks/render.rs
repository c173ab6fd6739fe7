use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::error::{Result, ToastError};
use crate::notification::{Position, Toast};
use crate::store::ToastSnapshot;

/// Presentation layer for a toast scope.
///
/// Implementations draw the given toasts and call `dismiss` on the provider
/// when the user closes one. `Toast::phase` is only an animation hint.
#[async_trait]
pub trait ToastRenderer: Send + Sync {
    async fn render(&self, position: Position, toasts: &[Toast]) -> Result<()>;
}

/// Renderer that writes each snapshot to the log as JSON
#[derive(Debug, Default)]
pub struct TracingRenderer;

#[async_trait]
impl ToastRenderer for TracingRenderer {
    async fn render(&self, position: Position, toasts: &[Toast]) -> Result<()> {
        let rendered = serde_json::to_string(toasts).map_err(|e| ToastError::Render(e.to_string()))?;
        tracing::info!(
            position = ?position,
            count = toasts.len(),
            toasts = %rendered,
            "Toast stack updated"
        );
        Ok(())
    }
}

/// Background task that re-renders on every published snapshot
pub struct RenderTask {
    renderer: Arc<dyn ToastRenderer>,
    position: Position,
    updates: watch::Receiver<ToastSnapshot>,
    shutdown: broadcast::Receiver<()>,
}

impl RenderTask {
    pub fn new(
        renderer: Arc<dyn ToastRenderer>,
        position: Position,
        updates: watch::Receiver<ToastSnapshot>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            renderer,
            position,
            updates,
            shutdown,
        }
    }

    /// Render until shutdown or until the provider goes away.
    ///
    /// Returns the number of render passes.
    pub async fn run(mut self) -> usize {
        let mut renders = 0;

        tracing::info!(position = ?self.position, "Render task started");

        let initial = self.updates.borrow_and_update().clone();
        self.render(&initial, &mut renders).await;

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Render task received shutdown signal");
                    break;
                }
                changed = self.updates.changed() => {
                    if changed.is_err() {
                        tracing::info!("Toast provider dropped, stopping render task");
                        break;
                    }
                    let snapshot = self.updates.borrow_and_update().clone();
                    self.render(&snapshot, &mut renders).await;
                }
            }
        }

        tracing::info!(renders = renders, "Render task stopped");
        renders
    }

    async fn render(&self, snapshot: &[Toast], renders: &mut usize) {
        match self.renderer.render(self.position, snapshot).await {
            Ok(()) => *renders += 1,
            Err(e) => {
                tracing::warn!(error = %e, count = snapshot.len(), "Failed to render toasts");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToastConfig;
    use crate::provider::ToastProvider;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl ToastRenderer for RecordingRenderer {
        async fn render(&self, _position: Position, toasts: &[Toast]) -> Result<()> {
            let frame = toasts.iter().map(|t| t.message.clone()).collect();
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl ToastRenderer for FailingRenderer {
        async fn render(&self, _position: Position, _toasts: &[Toast]) -> Result<()> {
            Err(ToastError::Render("surface lost".into()))
        }
    }

    #[tokio::test]
    async fn test_render_task_shutdown() {
        let provider = ToastProvider::new(ToastConfig::default()).unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = RenderTask::new(
            Arc::new(TracingRenderer),
            Position::TopRight,
            provider.subscribe(),
            shutdown_rx,
        );
        let handle = tokio::spawn(task.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(()).unwrap();

        let renders = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Task should complete")
            .expect("Task should not panic");
        assert_eq!(renders, 1);
    }

    #[tokio::test]
    async fn test_render_task_follows_updates() {
        let provider = ToastProvider::new(ToastConfig::default()).unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = RenderTask::new(
            renderer.clone(),
            Position::BottomLeft,
            provider.subscribe(),
            shutdown_rx,
        );
        let handle = tokio::spawn(task.run());
        tokio::task::yield_now().await;

        provider.show("Saved");
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Dropping the provider closes the channel and ends the task
        drop(provider);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Task should complete")
            .expect("Task should not panic");

        let frames = renderer.frames.lock().unwrap();
        assert!(frames.iter().any(|f| f == &vec!["Saved".to_string()]));
        assert_eq!(frames.last().unwrap(), &Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_render_errors_are_not_fatal() {
        let provider = ToastProvider::new(ToastConfig::default()).unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = RenderTask::new(
            Arc::new(FailingRenderer),
            Position::TopRight,
            provider.subscribe(),
            shutdown_rx,
        );
        let handle = tokio::spawn(task.run());

        provider.show("ignored");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        shutdown_tx.send(()).unwrap();
        let renders = handle.await.unwrap();
        assert_eq!(renders, 0);
    }
}
