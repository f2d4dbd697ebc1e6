//! Confirmation broker: a single active yes/no request, settled exactly once.
//!
//! A request that arrives while another one is active is either queued
//! behind it or rejected, depending on [`ConfirmationPolicy`]. It never
//! replaces the active request.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::sync::{broadcast, oneshot};

use crate::config::{ConfirmationConfig, ConfirmationPolicy};
use crate::metrics::ConfirmationMetrics;

use super::events::ManagerEvent;
use super::stats::ManagerStats;
use super::types::{ConfirmOptions, ConfirmationId, ConfirmationRequest};
use super::NotifyError;

/// Outcome of a confirmation, resolved once the user answers.
///
/// Resolves to `false` if the broker goes away before the request settles.
#[derive(Debug)]
#[must_use = "the confirmation outcome is only observed by awaiting it"]
pub struct PendingConfirmation {
    id: ConfirmationId,
    outcome: oneshot::Receiver<bool>,
}

impl PendingConfirmation {
    pub fn id(&self) -> ConfirmationId {
        self.id
    }
}

impl Future for PendingConfirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(false))
    }
}

struct Slot {
    request: ConfirmationRequest,
    respond_to: oneshot::Sender<bool>,
    requested_at: Instant,
}

impl Slot {
    /// The caller dropped its `PendingConfirmation`
    fn is_abandoned(&self) -> bool {
        self.respond_to.is_closed()
    }
}

#[derive(Default)]
struct BrokerState {
    active: Option<Slot>,
    waiting: VecDeque<Slot>,
    closed: bool,
}

pub struct ConfirmationBroker {
    state: Mutex<BrokerState>,
    config: ConfirmationConfig,
    events: broadcast::Sender<ManagerEvent>,
    stats: Arc<ManagerStats>,
}

impl ConfirmationBroker {
    pub(crate) fn new(
        config: ConfirmationConfig,
        events: broadcast::Sender<ManagerEvent>,
        stats: Arc<ManagerStats>,
    ) -> Self {
        Self {
            state: Mutex::new(BrokerState::default()),
            config,
            events,
            stats,
        }
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.config.policy
    }

    /// Publish a confirmation request.
    ///
    /// Fails with [`NotifyError::ConfirmationPending`] when another request is
    /// active and the policy is `reject`, and with [`NotifyError::Closed`]
    /// after shutdown.
    pub fn request(&self, options: ConfirmOptions) -> Result<PendingConfirmation, NotifyError> {
        let request = ConfirmationRequest::new(options, &self.config);
        let id = request.id;
        let (respond_to, outcome) = oneshot::channel();
        let slot = Slot {
            request,
            respond_to,
            requested_at: Instant::now(),
        };

        let mut state = self.lock();
        if state.closed {
            return Err(NotifyError::Closed);
        }

        ManagerStats::incr(&self.stats.confirmations_requested);
        ConfirmationMetrics::record_requested();

        self.retire_abandoned(&mut state);

        let active_id = state.active.as_ref().map(|active| active.request.id);
        match (active_id, self.config.policy) {
            (None, _) => self.activate(&mut state, slot),
            (Some(pending), ConfirmationPolicy::Reject) => {
                ManagerStats::incr(&self.stats.confirmations_rejected);
                ConfirmationMetrics::record_rejected();
                tracing::debug!(
                    confirmation_id = %id,
                    pending_id = %pending,
                    "Confirmation rejected, another one is pending"
                );
                return Err(NotifyError::ConfirmationPending { pending });
            }
            (Some(_), ConfirmationPolicy::Queue) => {
                state.waiting.push_back(slot);
                let position = state.waiting.len();
                ManagerStats::incr(&self.stats.confirmations_queued);
                ConfirmationMetrics::set_queued(position);
                tracing::debug!(
                    confirmation_id = %id,
                    position = position,
                    "Confirmation queued behind the active one"
                );
                let _ = self
                    .events
                    .send(ManagerEvent::ConfirmationQueued { id, position });
            }
        }

        Ok(PendingConfirmation { id, outcome })
    }

    /// Settle the active request. Returns `false` when `id` is not the
    /// active request, in which case nothing happens.
    pub fn resolve(&self, id: ConfirmationId, confirmed: bool) -> bool {
        let mut state = self.lock();

        let Some(slot) = state.active.take_if(|slot| slot.request.id == id) else {
            tracing::trace!(confirmation_id = %id, "Ignoring settlement of inactive confirmation");
            return false;
        };

        self.settle(slot, confirmed);
        self.promote_next(&mut state);
        true
    }

    /// Settle the active request as cancelled (backdrop click, escape)
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();

        let Some(slot) = state.active.take() else {
            return false;
        };

        self.settle(slot, false);
        self.promote_next(&mut state);
        true
    }

    /// The request currently shown to the user
    pub fn active(&self) -> Option<ConfirmationRequest> {
        self.lock().active.as_ref().map(|slot| slot.request.clone())
    }

    pub fn queued_len(&self) -> usize {
        self.lock().waiting.len()
    }

    /// Active plus queued requests
    pub fn pending_len(&self) -> usize {
        let state = self.lock();
        state.waiting.len() + usize::from(state.active.is_some())
    }

    /// Cancel everything outstanding and refuse further requests
    pub(crate) fn close(&self) -> usize {
        let mut state = self.lock();
        state.closed = true;

        let mut cancelled = 0;
        if let Some(slot) = state.active.take() {
            self.settle(slot, false);
            cancelled += 1;
        }
        while let Some(slot) = state.waiting.pop_front() {
            self.settle(slot, false);
            cancelled += 1;
        }
        ConfirmationMetrics::set_queued(0);
        cancelled
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn activate(&self, state: &mut BrokerState, slot: Slot) {
        tracing::debug!(confirmation_id = %slot.request.id, "Confirmation opened");
        let _ = self.events.send(ManagerEvent::ConfirmationOpened {
            request: slot.request.clone(),
        });
        state.active = Some(slot);
    }

    fn settle(&self, slot: Slot, confirmed: bool) {
        let id = slot.request.id;
        let waited = slot.requested_at.elapsed();
        let delivered = slot.respond_to.send(confirmed).is_ok();

        let counter = if confirmed {
            &self.stats.confirmations_confirmed
        } else {
            &self.stats.confirmations_cancelled
        };
        ManagerStats::incr(counter);
        ConfirmationMetrics::record_settled(confirmed, waited.as_secs_f64());

        tracing::debug!(
            confirmation_id = %id,
            confirmed = confirmed,
            delivered = delivered,
            waited_ms = waited.as_millis() as u64,
            "Confirmation settled"
        );

        let _ = self
            .events
            .send(ManagerEvent::ConfirmationSettled { id, confirmed });
    }

    /// Make the next live waiting request active
    fn promote_next(&self, state: &mut BrokerState) {
        while let Some(slot) = state.waiting.pop_front() {
            if slot.is_abandoned() {
                tracing::debug!(confirmation_id = %slot.request.id, "Skipping abandoned confirmation");
                self.settle(slot, false);
                continue;
            }
            self.activate(state, slot);
            break;
        }
        ConfirmationMetrics::set_queued(state.waiting.len());
    }

    /// Drop an active request nobody is waiting on anymore
    fn retire_abandoned(&self, state: &mut BrokerState) {
        let Some(slot) = state.active.take_if(|slot| slot.is_abandoned()) else {
            return;
        };
        tracing::debug!(confirmation_id = %slot.request.id, "Retiring abandoned confirmation");
        self.settle(slot, false);
        self.promote_next(state);
    }
}
