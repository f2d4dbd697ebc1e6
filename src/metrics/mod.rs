//! Prometheus metrics for the notification manager.
//!
//! - Toast metrics (posted by kind, removed by reason, currently visible)
//! - Confirmation metrics (requested, settled by outcome, rejected, queued)
//! - Confirmation wait latency

mod helpers;

pub use helpers::{encode_metrics, ConfirmationMetrics, ToastMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara";

lazy_static! {
    // ============================================================================
    // Toast Metrics
    // ============================================================================

    /// Toasts posted, by kind
    pub static ref TOASTS_POSTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_toasts_posted_total", METRIC_PREFIX),
        "Total toasts posted",
        &["kind"]
    ).unwrap();

    /// Toasts removed, by reason (manual, expired, cleared)
    pub static ref TOASTS_REMOVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_toasts_removed_total", METRIC_PREFIX),
        "Total toasts removed from the registry",
        &["reason"]
    ).unwrap();

    /// Toasts currently visible
    pub static ref TOASTS_VISIBLE: IntGauge = register_int_gauge!(
        format!("{}_toasts_visible", METRIC_PREFIX),
        "Number of toasts currently visible"
    ).unwrap();

    // ============================================================================
    // Confirmation Metrics
    // ============================================================================

    /// Confirmations requested
    pub static ref CONFIRMATIONS_REQUESTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_confirmations_requested_total", METRIC_PREFIX),
        "Total confirmations requested"
    ).unwrap();

    /// Confirmations settled, by outcome (confirmed, cancelled)
    pub static ref CONFIRMATIONS_SETTLED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_confirmations_settled_total", METRIC_PREFIX),
        "Total confirmations settled",
        &["outcome"]
    ).unwrap();

    /// Confirmations refused because another one was active
    pub static ref CONFIRMATIONS_REJECTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_confirmations_rejected_total", METRIC_PREFIX),
        "Total confirmations rejected while another was pending"
    ).unwrap();

    /// Confirmations waiting behind the active one
    pub static ref CONFIRMATIONS_QUEUED: IntGauge = register_int_gauge!(
        format!("{}_confirmations_queued", METRIC_PREFIX),
        "Number of confirmations waiting behind the active one"
    ).unwrap();

    /// Time from request to settlement
    pub static ref CONFIRMATION_WAIT_SECONDS: Histogram = register_histogram!(
        format!("{}_confirmation_wait_seconds", METRIC_PREFIX),
        "Time a confirmation waited for the user, in seconds",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        // lazy_static registers on first access
        TOASTS_VISIBLE.set(1);

        let output = encode_metrics().unwrap();
        assert!(output.contains("ara_toasts_visible"));
    }

    #[test]
    fn test_toast_metrics() {
        ToastMetrics::record_posted("success");
        ToastMetrics::record_removed("expired");
        ToastMetrics::set_visible(3);
        // Just verify no panics
    }

    #[test]
    fn test_confirmation_metrics() {
        ConfirmationMetrics::record_requested();
        ConfirmationMetrics::record_rejected();
        ConfirmationMetrics::record_settled(true, 1.5);
        ConfirmationMetrics::record_settled(false, 0.2);
        ConfirmationMetrics::set_queued(0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("ara_confirmations_settled_total"));
    }
}
