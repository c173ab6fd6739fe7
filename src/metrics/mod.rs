//! Prometheus metrics for toast lifecycle events.
//!
//! Counters are process-wide and aggregate across every provider scope.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "toast";

lazy_static! {
    /// Toasts created through `show`
    pub static ref TOAST_SHOWN_TOTAL: IntCounter = register_int_counter!(
        format!("{}_shown_total", METRIC_PREFIX),
        "Total number of toasts shown"
    ).unwrap();

    /// Transitions to `leaving`, by trigger
    pub static ref TOAST_DISMISSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dismissed_total", METRIC_PREFIX),
        "Total number of toasts dismissed",
        &["reason"]
    ).unwrap();

    /// Toasts dropped immediately because the scope was over capacity
    pub static ref TOAST_EVICTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_evicted_total", METRIC_PREFIX),
        "Total number of toasts evicted by the capacity bound"
    ).unwrap();

    /// Toasts removed after their exit delay
    pub static ref TOAST_REMOVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_removed_total", METRIC_PREFIX),
        "Total number of toasts removed after leaving"
    ).unwrap();

    /// Pending timers canceled by dismiss, eviction or teardown
    pub static ref TOAST_TIMERS_CANCELED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_timers_canceled_total", METRIC_PREFIX),
        "Total number of pending toast timers canceled"
    ).unwrap();

    /// Toasts currently held across all scopes
    pub static ref TOAST_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_active", METRIC_PREFIX),
        "Number of toasts currently held by providers"
    ).unwrap();
}

/// Why a toast entered the `leaving` phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Manual,
    Auto,
}

impl DismissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissReason::Manual => "manual",
            DismissReason::Auto => "auto",
        }
    }
}

pub struct ToastMetrics;

impl ToastMetrics {
    pub fn shown() {
        TOAST_SHOWN_TOTAL.inc();
        TOAST_ACTIVE.inc();
    }

    pub fn dismissed(reason: DismissReason) {
        TOAST_DISMISSED_TOTAL
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    pub fn evicted(count: usize) {
        if count > 0 {
            TOAST_EVICTED_TOTAL.inc_by(count as u64);
            TOAST_ACTIVE.sub(count as i64);
        }
    }

    pub fn removed() {
        TOAST_REMOVED_TOTAL.inc();
        TOAST_ACTIVE.dec();
    }

    /// Entries dropped without going through the exit delay (clear, teardown)
    pub fn discarded(count: usize) {
        if count > 0 {
            TOAST_ACTIVE.sub(count as i64);
        }
    }

    pub fn timers_canceled(count: usize) {
        if count > 0 {
            TOAST_TIMERS_CANCELED_TOTAL.inc_by(count as u64);
        }
    }
}

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}
