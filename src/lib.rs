// Shared components
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer
pub mod notification;
pub mod scheduler;
pub mod store;

// Public API
pub mod provider;

// Supporting modules
pub mod tasks;

pub use error::{Result, ToastError};
pub use notification::{Phase, Position, StackOrder, Toast, ToastId, ToastInput, Variant};
pub use provider::{use_toast, ToastHandle, ToastProvider, ToastStats};
