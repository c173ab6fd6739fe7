//! Toast notification types.
//!
//! A `Toast` is a transient message with a bounded visible lifetime. Callers
//! describe what they want shown with a `ToastInput`; the provider fills in
//! the id, defaults and lifecycle phase.

mod types;

pub use types::{Phase, Position, StackOrder, Toast, ToastId, ToastInput, Variant};
