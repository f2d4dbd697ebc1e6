//! Toast registry: the ordered set of visible toasts and their expiry timers.
//!
//! Entries are kept most-recent-first. Each entry owns the abort handle of its
//! expiry timer, and both live under the same lock, so a timer that fires
//! while the toast is being dismissed either removes it or finds it gone.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

use crate::metrics::ToastMetrics;

use super::events::{DismissReason, ManagerEvent};
use super::stats::ManagerStats;
use super::types::{ToastId, ToastInput, ToastMessage};

struct Entry {
    message: ToastMessage,
    timer: Option<AbortHandle>,
}

#[derive(Default)]
struct RegistryState {
    /// Head is the most recently posted toast
    entries: VecDeque<Entry>,
    closed: bool,
}

struct RegistryInner {
    state: Mutex<RegistryState>,
    default_ttl: Duration,
    runtime: Handle,
    events: broadcast::Sender<ManagerEvent>,
    stats: Arc<ManagerStats>,
}

/// Holds the currently visible toasts
pub struct ToastRegistry {
    inner: Arc<RegistryInner>,
}

impl ToastRegistry {
    pub(crate) fn new(
        default_ttl: Duration,
        runtime: Handle,
        events: broadcast::Sender<ManagerEvent>,
        stats: Arc<ManagerStats>,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                state: Mutex::new(RegistryState::default()),
                default_ttl,
                runtime,
                events,
                stats,
            }),
        }
    }

    /// Insert a toast at the head of the visible set and schedule its expiry.
    ///
    /// After [`close`](Self::close) the toast is dropped, but an id is still
    /// returned.
    pub fn post(&self, input: ToastInput) -> ToastId {
        match self.insert(input) {
            Ok(id) | Err(id) => id,
        }
    }

    /// Like [`post`](Self::post), but returns `None` when the registry is
    /// closed and the toast was dropped.
    pub fn try_post(&self, input: ToastInput) -> Option<ToastId> {
        self.insert(input).ok()
    }

    /// `Err` carries the id of a toast dropped because the registry is closed
    fn insert(&self, input: ToastInput) -> Result<ToastId, ToastId> {
        let ttl = input.requested_ttl().resolve(self.inner.default_ttl);
        let message = ToastMessage::new(input, ttl);
        let id = message.id;

        let mut state = self.inner.lock();
        if state.closed {
            tracing::debug!(toast_id = %id, "Registry closed, dropping toast");
            return Err(id);
        }

        let timer = ttl.map(|delay| self.schedule_expiry(id, delay));
        state.entries.push_front(Entry {
            message: message.clone(),
            timer,
        });

        ManagerStats::incr(&self.inner.stats.toasts_posted);
        ToastMetrics::record_posted(message.kind.as_str());
        ToastMetrics::set_visible(state.entries.len());

        tracing::debug!(
            toast_id = %id,
            kind = message.kind.as_str(),
            ttl_ms = ?message.ttl_ms,
            visible = state.entries.len(),
            "Toast posted"
        );

        let _ = self.inner.events.send(ManagerEvent::ToastPosted { toast: message });
        Ok(id)
    }

    /// Remove a toast and cancel its timer. Unknown ids are ignored.
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.inner.remove(id, DismissReason::Manual)
    }

    /// Remove every toast, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut state = self.inner.lock();
        self.inner.clear_locked(&mut state)
    }

    /// Clear the registry and drop every toast posted afterwards
    pub(crate) fn close(&self) -> usize {
        let mut state = self.inner.lock();
        state.closed = true;
        self.inner.clear_locked(&mut state)
    }

    /// Visible toasts, most recent first
    pub fn snapshot(&self) -> Vec<ToastMessage> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn get(&self, id: ToastId) -> Option<ToastMessage> {
        self.inner
            .lock()
            .entries
            .iter()
            .find(|entry| entry.message.id == id)
            .map(|entry| entry.message.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule_expiry(&self, id: ToastId, delay: Duration) -> AbortHandle {
        let registry = Arc::downgrade(&self.inner);
        self.inner
            .runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(registry) = registry.upgrade() {
                    registry.remove(id, DismissReason::Expired);
                }
            })
            .abort_handle()
    }
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: ToastId, reason: DismissReason) -> bool {
        let mut state = self.lock();

        let Some(position) = state.entries.iter().position(|e| e.message.id == id) else {
            tracing::trace!(toast_id = %id, reason = reason.as_str(), "Toast already gone");
            return false;
        };
        let Some(entry) = state.entries.remove(position) else {
            return false;
        };

        // The expiry task is the caller in that case and finishes on its own
        if reason != DismissReason::Expired {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }

        let counter = match reason {
            DismissReason::Expired => &self.stats.toasts_expired,
            _ => &self.stats.toasts_dismissed,
        };
        ManagerStats::incr(counter);
        ToastMetrics::record_removed(reason.as_str());
        ToastMetrics::set_visible(state.entries.len());

        tracing::debug!(
            toast_id = %id,
            reason = reason.as_str(),
            visible = state.entries.len(),
            "Toast removed"
        );

        let _ = self.events.send(ManagerEvent::ToastDismissed { id, reason });
        true
    }

    fn clear_locked(&self, state: &mut RegistryState) -> usize {
        let removed = state.entries.len();
        if removed == 0 {
            return 0;
        }

        for entry in state.entries.drain(..) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            let _ = self.events.send(ManagerEvent::ToastDismissed {
                id: entry.message.id,
                reason: DismissReason::Cleared,
            });
        }

        ManagerStats::add(&self.stats.toasts_cleared, removed as u64);
        ToastMetrics::record_removed_many(DismissReason::Cleared.as_str(), removed as u64);
        ToastMetrics::set_visible(0);

        tracing::debug!(removed = removed, "Toast registry cleared");
        removed
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for entry in state.entries.drain(..) {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::ToastKind;

    fn create_registry() -> (ToastRegistry, broadcast::Receiver<ManagerEvent>) {
        let (events, rx) = broadcast::channel(64);
        let registry = ToastRegistry::new(
            Duration::from_millis(4000),
            Handle::current(),
            events,
            Arc::new(ManagerStats::default()),
        );
        (registry, rx)
    }

    #[tokio::test]
    async fn test_post_orders_most_recent_first() {
        let (registry, _rx) = create_registry();

        let first = registry.post(ToastInput::new("un").unwrap());
        let second = registry.post(ToastInput::new("deux").unwrap());
        let third = registry.post(ToastInput::new("trois").unwrap());

        let ids: Vec<ToastId> = registry.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[tokio::test]
    async fn test_dismiss_is_idempotent() {
        let (registry, _rx) = create_registry();
        let keep = registry.post(ToastInput::new("garder").unwrap());
        let id = registry.post(ToastInput::new("retirer").unwrap());

        assert!(registry.dismiss(id));
        assert!(!registry.dismiss(id));

        assert_eq!(registry.len(), 1);
        assert!(registry.get(keep).is_some());
        assert!(registry.get(id).is_none());
    }

    #[tokio::test]
    async fn test_dismiss_unknown_id_is_noop() {
        let (registry, mut rx) = create_registry();

        assert!(!registry.dismiss(ToastId::new()));
        assert!(registry.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_post_emits_event_with_resolved_ttl() {
        let (registry, mut rx) = create_registry();
        let id = registry.post(ToastInput::error("Échec").unwrap());

        match rx.try_recv().unwrap() {
            ManagerEvent::ToastPosted { toast } => {
                assert_eq!(toast.id, id);
                assert_eq!(toast.kind, ToastKind::Error);
                assert_eq!(toast.ttl_ms, Some(4000));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_ttl_expires() {
        let (registry, mut rx) = create_registry();
        let id = registry.post(ToastInput::new("court").unwrap().ttl_ms(50));
        let _ = rx.recv().await;

        tokio::time::sleep(Duration::from_millis(49)).await;
        assert!(registry.get(id).is_some());

        assert_eq!(
            rx.recv().await.unwrap(),
            ManagerEvent::ToastDismissed {
                id,
                reason: DismissReason::Expired
            }
        );
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_expiring_toast_stays() {
        let (registry, _rx) = create_registry();
        let id = registry.post(ToastInput::new("permanent").unwrap().never_expire());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(registry.get(id).is_some());
    }

    #[tokio::test]
    async fn test_close_clears_and_drops_later_posts() {
        let (registry, mut rx) = create_registry();
        registry.post(ToastInput::new("a").unwrap());
        registry.post(ToastInput::new("b").unwrap().never_expire());
        while rx.try_recv().is_ok() {}

        assert_eq!(registry.close(), 2);
        for _ in 0..2 {
            assert!(matches!(
                rx.try_recv().unwrap(),
                ManagerEvent::ToastDismissed {
                    reason: DismissReason::Cleared,
                    ..
                }
            ));
        }

        registry.post(ToastInput::new("trop tard").unwrap());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_try_post_reports_dropped_toast() {
        let (registry, mut rx) = create_registry();
        assert!(registry.try_post(ToastInput::new("avant").unwrap()).is_some());
        registry.close();
        while rx.try_recv().is_ok() {}

        assert_eq!(registry.try_post(ToastInput::new("après").unwrap()), None);
        assert!(registry.is_empty());
        assert!(rx.try_recv().is_err());
    }
}
