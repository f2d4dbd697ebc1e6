use prometheus::{Encoder, TextEncoder};

use super::{
    CONFIRMATIONS_QUEUED, CONFIRMATIONS_REJECTED_TOTAL, CONFIRMATIONS_REQUESTED_TOTAL,
    CONFIRMATIONS_SETTLED_TOTAL, CONFIRMATION_WAIT_SECONDS, TOASTS_POSTED_TOTAL,
    TOASTS_REMOVED_TOTAL, TOASTS_VISIBLE,
};

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording toast metrics
pub struct ToastMetrics;

impl ToastMetrics {
    pub fn record_posted(kind: &str) {
        TOASTS_POSTED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_removed(reason: &str) {
        TOASTS_REMOVED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn record_removed_many(reason: &str, count: u64) {
        TOASTS_REMOVED_TOTAL.with_label_values(&[reason]).inc_by(count);
    }

    pub fn set_visible(count: usize) {
        TOASTS_VISIBLE.set(count as i64);
    }
}

/// Helper struct for recording confirmation metrics
pub struct ConfirmationMetrics;

impl ConfirmationMetrics {
    pub fn record_requested() {
        CONFIRMATIONS_REQUESTED_TOTAL.inc();
    }

    pub fn record_rejected() {
        CONFIRMATIONS_REJECTED_TOTAL.inc();
    }

    /// Record a settlement and how long the request waited
    pub fn record_settled(confirmed: bool, waited_seconds: f64) {
        let outcome = if confirmed { "confirmed" } else { "cancelled" };
        CONFIRMATIONS_SETTLED_TOTAL.with_label_values(&[outcome]).inc();
        CONFIRMATION_WAIT_SECONDS.observe(waited_seconds);
    }

    pub fn set_queued(count: usize) {
        CONFIRMATIONS_QUEUED.set(count as i64);
    }
}
