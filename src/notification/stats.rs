use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by the registry, the broker and the manager
#[derive(Debug, Default)]
pub struct ManagerStats {
    pub toasts_posted: AtomicU64,
    pub toasts_dismissed: AtomicU64,
    pub toasts_expired: AtomicU64,
    pub toasts_cleared: AtomicU64,
    pub confirmations_requested: AtomicU64,
    pub confirmations_confirmed: AtomicU64,
    pub confirmations_cancelled: AtomicU64,
    pub confirmations_rejected: AtomicU64,
    /// Requests that had to wait behind another one
    pub confirmations_queued: AtomicU64,
}

impl ManagerStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, visible_toasts: usize, pending_confirmations: usize) -> ManagerStatsSnapshot {
        ManagerStatsSnapshot {
            visible_toasts,
            pending_confirmations,
            toasts_posted: self.toasts_posted.load(Ordering::Relaxed),
            toasts_dismissed: self.toasts_dismissed.load(Ordering::Relaxed),
            toasts_expired: self.toasts_expired.load(Ordering::Relaxed),
            toasts_cleared: self.toasts_cleared.load(Ordering::Relaxed),
            confirmations_requested: self.confirmations_requested.load(Ordering::Relaxed),
            confirmations_confirmed: self.confirmations_confirmed.load(Ordering::Relaxed),
            confirmations_cancelled: self.confirmations_cancelled.load(Ordering::Relaxed),
            confirmations_rejected: self.confirmations_rejected.load(Ordering::Relaxed),
            confirmations_queued: self.confirmations_queued.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of manager statistics
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStatsSnapshot {
    pub visible_toasts: usize,
    /// Active plus queued confirmations
    pub pending_confirmations: usize,
    pub toasts_posted: u64,
    pub toasts_dismissed: u64,
    pub toasts_expired: u64,
    pub toasts_cleared: u64,
    pub confirmations_requested: u64,
    pub confirmations_confirmed: u64,
    pub confirmations_cancelled: u64,
    pub confirmations_rejected: u64,
    pub confirmations_queued: u64,
}
