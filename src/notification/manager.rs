use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::config::NotificationsConfig;

use super::broker::{ConfirmationBroker, PendingConfirmation};
use super::events::ManagerEvent;
use super::registry::ToastRegistry;
use super::stats::{ManagerStats, ManagerStatsSnapshot};
use super::types::{
    ConfirmOptions, ConfirmationId, ConfirmationRequest, ToastId, ToastInput, ToastMessage,
};
use super::NotifyError;

/// Result of tearing the manager down
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShutdownReport {
    pub toasts_cleared: usize,
    pub confirmations_cancelled: usize,
}

/// Process-wide notification and confirmation manager.
///
/// Create one per application, wrap it in an `Arc` and hand it to every
/// component that reports outcomes or gates destructive actions.
pub struct NotificationManager {
    toasts: ToastRegistry,
    confirmations: ConfirmationBroker,
    events: broadcast::Sender<ManagerEvent>,
    stats: Arc<ManagerStats>,
    closed: AtomicBool,
}

impl NotificationManager {
    /// Create a manager driven by the current Tokio runtime
    pub fn new(config: &NotificationsConfig) -> Result<Self, NotifyError> {
        let runtime = Handle::try_current().map_err(|_| NotifyError::NoRuntime)?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Create a manager whose toast timers run on `runtime`
    pub fn with_runtime(config: &NotificationsConfig, runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let stats = Arc::new(ManagerStats::default());

        let toasts = ToastRegistry::new(
            config.toast.default_ttl(),
            runtime,
            events.clone(),
            stats.clone(),
        );
        let confirmations =
            ConfirmationBroker::new(config.confirmation.clone(), events.clone(), stats.clone());

        tracing::info!(
            default_ttl_ms = config.toast.default_ttl_ms,
            policy = ?config.confirmation.policy,
            "Notification manager initialized"
        );

        Self {
            toasts,
            confirmations,
            events,
            stats,
            closed: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Toasts
    // ------------------------------------------------------------------

    /// Show a toast; it expires on its own unless posted with `Ttl::Never`.
    pub fn post(&self, input: ToastInput) -> ToastId {
        self.toasts.post(input)
    }

    /// Show a toast, failing with [`NotifyError::Closed`] when the manager has
    /// been shut down and the toast would be dropped.
    pub fn try_post(&self, input: ToastInput) -> Result<ToastId, NotifyError> {
        self.toasts.try_post(input).ok_or(NotifyError::Closed)
    }

    pub fn success(&self, body: impl Into<String>) -> Result<ToastId, NotifyError> {
        Ok(self.post(ToastInput::success(body)?))
    }

    pub fn error(&self, body: impl Into<String>) -> Result<ToastId, NotifyError> {
        Ok(self.post(ToastInput::error(body)?))
    }

    pub fn info(&self, body: impl Into<String>) -> Result<ToastId, NotifyError> {
        Ok(self.post(ToastInput::info(body)?))
    }

    pub fn warning(&self, body: impl Into<String>) -> Result<ToastId, NotifyError> {
        Ok(self.post(ToastInput::warning(body)?))
    }

    /// Remove a toast. Returns whether it was still visible.
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.toasts.dismiss(id)
    }

    /// Remove every visible toast, returning how many were removed
    pub fn clear_toasts(&self) -> usize {
        self.toasts.clear()
    }

    /// Visible toasts, most recent first
    pub fn toasts(&self) -> Vec<ToastMessage> {
        self.toasts.snapshot()
    }

    // ------------------------------------------------------------------
    // Confirmations
    // ------------------------------------------------------------------

    /// Ask the user a yes/no question. Await the returned value for the answer.
    pub fn request(&self, options: ConfirmOptions) -> Result<PendingConfirmation, NotifyError> {
        self.confirmations.request(options)
    }

    /// Ask and wait for the answer
    #[tracing::instrument(name = "notifications.confirm", skip(self, options))]
    pub async fn confirm(&self, options: ConfirmOptions) -> Result<bool, NotifyError> {
        let pending = self.request(options)?;
        tracing::debug!(confirmation_id = %pending.id(), "Waiting for user decision");
        Ok(pending.await)
    }

    /// Settle the active confirmation. Stale ids are ignored and return `false`.
    pub fn resolve_confirmation(&self, id: ConfirmationId, confirmed: bool) -> bool {
        self.confirmations.resolve(id, confirmed)
    }

    /// Dismiss the confirmation surface, settling it as `false`
    pub fn cancel_confirmation(&self) -> bool {
        self.confirmations.cancel()
    }

    /// The confirmation currently shown, if any
    pub fn pending_confirmation(&self) -> Option<ConfirmationRequest> {
        self.confirmations.active()
    }

    /// Requests waiting behind the active one
    pub fn queued_confirmations(&self) -> usize {
        self.confirmations.queued_len()
    }

    // ------------------------------------------------------------------
    // Observation & lifecycle
    // ------------------------------------------------------------------

    /// Receive every state change from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    /// Number of live event receivers
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn stats(&self) -> ManagerStatsSnapshot {
        self.stats
            .snapshot(self.toasts.len(), self.confirmations.pending_len())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Tear the manager down: clear toasts, cancel outstanding confirmations.
    ///
    /// Only the first call has an effect.
    pub fn shutdown(&self) -> ShutdownReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return ShutdownReport::default();
        }

        let report = ShutdownReport {
            toasts_cleared: self.toasts.close(),
            confirmations_cancelled: self.confirmations.close(),
        };
        let _ = self.events.send(ManagerEvent::Closed);

        tracing::info!(
            toasts_cleared = report.toasts_cleared,
            confirmations_cancelled = report.confirmations_cancelled,
            "Notification manager shut down"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfirmationPolicy;
    use crate::notification::{DismissReason, ToastKind};
    use std::time::Duration;

    fn create_manager() -> NotificationManager {
        NotificationManager::new(&NotificationsConfig::default()).unwrap()
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = NotificationManager::new(&NotificationsConfig::default());
        assert!(matches!(result, Err(NotifyError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_shorthands_set_kind() {
        let manager = create_manager();
        manager.success("Tâche ajoutée").unwrap();
        manager.warning("Date invalide").unwrap();

        let kinds: Vec<ToastKind> = manager.toasts().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![ToastKind::Warning, ToastKind::Success]);
        assert!(manager.error(" ").is_err());
    }

    #[tokio::test]
    async fn test_confirm_waits_for_resolution() {
        let manager = Arc::new(create_manager());
        let mut events = manager.subscribe();

        let caller = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .confirm(ConfirmOptions::new("Supprimer ce groupe ?").unwrap())
                    .await
            })
        };

        let request = match events.recv().await.unwrap() {
            ManagerEvent::ConfirmationOpened { request } => request,
            other => panic!("unexpected event: {:?}", other),
        };
        assert_eq!(manager.pending_confirmation(), Some(request.clone()));

        assert!(manager.resolve_confirmation(request.id, true));
        assert_eq!(caller.await.unwrap(), Ok(true));
        assert!(manager.pending_confirmation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_from_config() {
        let mut config = NotificationsConfig::default();
        config.toast.default_ttl_ms = 1000;
        let manager = NotificationManager::new(&config).unwrap();
        let mut events = manager.subscribe();

        let id = manager.info("Synchronisé").unwrap();
        let _ = events.recv().await;
        let start = tokio::time::Instant::now();

        assert_eq!(
            events.recv().await.unwrap(),
            ManagerEvent::ToastDismissed {
                id,
                reason: DismissReason::Expired
            }
        );
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut config = NotificationsConfig::default();
        config.confirmation.policy = ConfirmationPolicy::Queue;
        let manager = NotificationManager::new(&config).unwrap();

        manager.success("a").unwrap();
        let first = manager.request(ConfirmOptions::new("Premier ?").unwrap()).unwrap();
        let second = manager.request(ConfirmOptions::new("Second ?").unwrap()).unwrap();

        let report = manager.shutdown();
        assert_eq!(report.toasts_cleared, 1);
        assert_eq!(report.confirmations_cancelled, 2);
        assert!(!first.await);
        assert!(!second.await);

        assert_eq!(
            manager.try_post(ToastInput::info("trop tard").unwrap()),
            Err(NotifyError::Closed)
        );
        assert!(manager.toasts().is_empty());

        let again = manager.shutdown();
        assert_eq!(again.toasts_cleared, 0);
        assert!(manager.is_closed());
        assert!(matches!(
            manager.request(ConfirmOptions::new("Encore ?").unwrap()),
            Err(NotifyError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_clear_toasts_keeps_confirmation() {
        let manager = create_manager();
        manager.success("a").unwrap();
        manager.post(ToastInput::info("b").unwrap().never_expire());
        let _pending = manager.request(ConfirmOptions::new("Ok ?").unwrap()).unwrap();

        assert_eq!(manager.clear_toasts(), 2);
        assert!(manager.toasts().is_empty());
        assert!(manager.pending_confirmation().is_some());
        assert_eq!(manager.stats().toasts_cleared, 2);
        assert_eq!(manager.clear_toasts(), 0);
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let manager = create_manager();
        let id = manager.success("a").unwrap();
        manager.success("b").unwrap();
        manager.dismiss(id);
        let pending = manager.request(ConfirmOptions::new("Ok ?").unwrap()).unwrap();
        manager.cancel_confirmation();
        assert!(!pending.await);

        let stats = manager.stats();
        assert_eq!(stats.visible_toasts, 1);
        assert_eq!(stats.toasts_posted, 2);
        assert_eq!(stats.toasts_dismissed, 1);
        assert_eq!(stats.confirmations_requested, 1);
        assert_eq!(stats.confirmations_cancelled, 1);
        assert_eq!(stats.pending_confirmations, 0);
    }
}
