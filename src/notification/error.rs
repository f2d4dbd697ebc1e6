use thiserror::Error;

use super::types::ConfirmationId;

/// Errors surfaced by the notification manager to its callers.
///
/// Stale operations (dismissing an unknown toast, resolving a confirmation
/// that is no longer active) are not errors and never produce one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Required body text was empty or whitespace only
    #[error("{what} body must not be empty")]
    EmptyBody { what: &'static str },

    /// A confirmation is already active and the policy rejects new ones
    #[error("confirmation {pending} is already pending")]
    ConfirmationPending { pending: ConfirmationId },

    /// The manager has been shut down
    #[error("notification manager is shut down")]
    Closed,

    /// No Tokio runtime was available to drive toast expiry timers
    #[error("notification manager requires a Tokio runtime")]
    NoRuntime,
}
