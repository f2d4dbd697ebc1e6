//! Change events published by the manager for rendering adapters.

use serde::Serialize;

use super::types::{ConfirmationId, ConfirmationRequest, ToastId, ToastMessage};

/// Why a toast left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissReason {
    /// Closed by the user or by calling code
    Manual,
    /// TTL elapsed
    Expired,
    /// Removed by a bulk clear or on teardown
    Cleared,
}

impl DismissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissReason::Manual => "manual",
            DismissReason::Expired => "expired",
            DismissReason::Cleared => "cleared",
        }
    }
}

/// Event emitted on every state change of the manager
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManagerEvent {
    ToastPosted {
        toast: ToastMessage,
    },
    ToastDismissed {
        id: ToastId,
        reason: DismissReason,
    },
    /// A request became the active confirmation
    ConfirmationOpened {
        request: ConfirmationRequest,
    },
    /// A request is waiting behind the active one
    ConfirmationQueued {
        id: ConfirmationId,
        position: usize,
    },
    ConfirmationSettled {
        id: ConfirmationId,
        confirmed: bool,
    },
    /// The manager was shut down; no further events follow
    Closed,
}

impl ManagerEvent {
    /// Event name used by the SSE adapter
    pub fn name(&self) -> &'static str {
        match self {
            ManagerEvent::ToastPosted { .. } => "toast_posted",
            ManagerEvent::ToastDismissed { .. } => "toast_dismissed",
            ManagerEvent::ConfirmationOpened { .. } => "confirmation_opened",
            ManagerEvent::ConfirmationQueued { .. } => "confirmation_queued",
            ManagerEvent::ConfirmationSettled { .. } => "confirmation_settled",
            ManagerEvent::Closed => "closed",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let id = ToastId::new();
        let event = ManagerEvent::ToastDismissed {
            id,
            reason: DismissReason::Expired,
        };

        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], event.name());
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["reason"], "expired");
    }

    #[test]
    fn test_closed_event_name() {
        let json: serde_json::Value =
            serde_json::from_str(&ManagerEvent::Closed.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "closed");
    }
}
