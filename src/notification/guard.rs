//! Traits through which screens receive the manager, and the helper that
//! gates destructive actions on user assent.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::manager::NotificationManager;
use super::types::{ConfirmOptions, ToastId, ToastInput};
use super::NotifyError;

/// Non-blocking outcome reporting
pub trait Notifier: Send + Sync {
    fn post(&self, input: ToastInput) -> ToastId;

    fn dismiss(&self, id: ToastId) -> bool;
}

/// Suspends the caller until the user answers a yes/no question
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, options: ConfirmOptions) -> Result<bool, NotifyError>;
}

impl Notifier for NotificationManager {
    fn post(&self, input: ToastInput) -> ToastId {
        NotificationManager::post(self, input)
    }

    fn dismiss(&self, id: ToastId) -> bool {
        NotificationManager::dismiss(self, id)
    }
}

#[async_trait]
impl Confirmer for NotificationManager {
    async fn confirm(&self, options: ConfirmOptions) -> Result<bool, NotifyError> {
        NotificationManager::confirm(self, options).await
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn post(&self, input: ToastInput) -> ToastId {
        (**self).post(input)
    }

    fn dismiss(&self, id: ToastId) -> bool {
        (**self).dismiss(id)
    }
}

#[async_trait]
impl<T: Confirmer + ?Sized> Confirmer for Arc<T> {
    async fn confirm(&self, options: ConfirmOptions) -> Result<bool, NotifyError> {
        (**self).confirm(options).await
    }
}

/// Run `action` only if the user confirms.
///
/// Returns `Ok(None)` without touching `action` when the answer is no.
pub async fn run_if_confirmed<C, F, Fut, T>(
    confirmer: &C,
    options: ConfirmOptions,
    action: F,
) -> Result<Option<T>, NotifyError>
where
    C: Confirmer + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    if confirmer.confirm(options).await? {
        Ok(Some(action().await))
    } else {
        tracing::debug!("Action aborted by user");
        Ok(None)
    }
}
