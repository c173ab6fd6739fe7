use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toast_notifications::config::{LoggingConfig, Settings};
use toast_notifications::metrics::encode_metrics;
use toast_notifications::tasks::{RenderTask, TracingRenderer};
use toast_notifications::{use_toast, ToastInput, ToastProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.logging);
    tracing::info!("Configuration loaded");

    let provider = ToastProvider::new(settings.toast.clone())?;
    let (shutdown_tx, _) = broadcast::channel(1);

    // Start renderer in background
    let render_task = RenderTask::new(
        Arc::new(TracingRenderer),
        settings.toast.position,
        provider.subscribe(),
        shutdown_tx.subscribe(),
    );
    let render_handle = tokio::spawn(render_task.run());

    // Simulated form submissions reach the API through the scope accessor
    provider.scope(submit_forms()).await?;

    let mut updates = provider.updates();
    let drained = async {
        while let Some(snapshot) = updates.next().await {
            if snapshot.is_empty() {
                break;
            }
        }
    };

    tokio::select! {
        _ = drained => {
            tracing::info!("All toasts dismissed");
        }
        _ = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(());
    let renders = render_handle.await?;
    let canceled = provider.shutdown();

    tracing::info!(renders = renders, canceled_timers = canceled, "Demo finished");
    tracing::debug!(metrics = %encode_metrics()?, "Final metrics");
    Ok(())
}

async fn submit_forms() -> Result<()> {
    let toast = use_toast()?;

    toast.show(ToastInput::success("Welcome back!").title("Login"))?;
    tokio::time::sleep(Duration::from_millis(300)).await;

    toast.show(ToastInput::error("Email is already registered.").title("Registration"))?;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let pending = toast.show(
        ToastInput::info("Processing your donation...")
            .duration(Duration::from_secs(10)),
    )?;
    tokio::time::sleep(Duration::from_millis(800)).await;
    toast.dismiss(pending)?;
    toast.show(ToastInput::success("Thank you for your donation!").duration_ms(1000))?;

    toast.show(ToastInput::warning("Please double-check your input."))?;
    toast.show(ToastInput::info("A reset link has been sent to your inbox."))?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        }
    }
}
