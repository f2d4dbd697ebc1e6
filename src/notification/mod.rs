//! Toast notifications and user confirmations.
//!
//! # Architecture
//!
//! A single [`NotificationManager`] owns two components:
//!
//! - `ToastRegistry`: the visible toasts, most recent first, each with an
//!   optional fire-once expiry timer
//! - `ConfirmationBroker`: at most one active yes/no request, settled exactly
//!   once, with later requests queued or rejected per [`ConfirmationPolicy`]
//!
//! Every state change is published as a [`ManagerEvent`] so rendering
//! adapters can mirror the manager without reaching into its state.
//!
//! [`ConfirmationPolicy`]: crate::config::ConfirmationPolicy

mod broker;
mod error;
mod events;
mod guard;
mod manager;
mod registry;
mod stats;
mod types;

pub use broker::{ConfirmationBroker, PendingConfirmation};
pub use error::NotifyError;
pub use events::{DismissReason, ManagerEvent};
pub use guard::{run_if_confirmed, Confirmer, Notifier};
pub use manager::{NotificationManager, ShutdownReport};
pub use registry::ToastRegistry;
pub use stats::{ManagerStats, ManagerStatsSnapshot};
pub use types::{
    ConfirmOptions, ConfirmationId, ConfirmationRequest, ToastId, ToastInput, ToastKind,
    ToastMessage, Ttl,
};
