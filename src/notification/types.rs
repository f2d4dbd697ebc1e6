use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfirmationConfig;

use super::NotifyError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a posted toast, stable for the toast's lifetime
    ToastId
);

opaque_id!(
    /// Identifier of a confirmation request
    ConfirmationId
);

/// Visual category of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
        }
    }
}

/// Time-to-live requested for a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the manager's configured default
    #[default]
    Default,
    /// Stay visible until explicitly dismissed
    Never,
    /// Dismiss automatically after the given delay
    After(Duration),
}

impl Ttl {
    /// Map an explicit millisecond value, where `None` means "never expire".
    pub fn from_millis(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) => Ttl::After(Duration::from_millis(ms)),
            None => Ttl::Never,
        }
    }

    /// Resolve against the default TTL; `None` means no expiry timer.
    pub fn resolve(self, default: Duration) -> Option<Duration> {
        match self {
            Ttl::Default => Some(default),
            Ttl::Never => None,
            Ttl::After(delay) => Some(delay),
        }
    }
}

fn require_body(body: String, what: &'static str) -> Result<String, NotifyError> {
    if body.trim().is_empty() {
        return Err(NotifyError::EmptyBody { what });
    }
    Ok(body)
}

/// Input for posting a toast.
///
/// The body is validated when the input is created, so a malformed toast is
/// reported where it is built and posting itself cannot fail.
#[derive(Debug, Clone)]
pub struct ToastInput {
    kind: ToastKind,
    title: Option<String>,
    body: String,
    ttl: Ttl,
}

impl ToastInput {
    /// Create an `info` toast input with the default TTL
    pub fn new(body: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            kind: ToastKind::default(),
            title: None,
            body: require_body(body.into(), "toast")?,
            ttl: Ttl::Default,
        })
    }

    pub fn success(body: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self::new(body)?.kind(ToastKind::Success))
    }

    pub fn error(body: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self::new(body)?.kind(ToastKind::Error))
    }

    pub fn info(body: impl Into<String>) -> Result<Self, NotifyError> {
        Self::new(body)
    }

    pub fn warning(body: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self::new(body)?.kind(ToastKind::Warning))
    }

    pub fn kind(mut self, kind: ToastKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Dismiss automatically after `ms` milliseconds
    pub fn ttl_ms(self, ms: u64) -> Self {
        self.ttl(Ttl::After(Duration::from_millis(ms)))
    }

    /// Keep the toast until it is dismissed explicitly
    pub fn never_expire(self) -> Self {
        self.ttl(Ttl::Never)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn requested_ttl(&self) -> Ttl {
        self.ttl
    }
}

/// A visible toast. Never mutated after it is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub id: ToastId,
    pub kind: ToastKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    /// Resolved TTL in milliseconds, `null` when the toast never expires
    pub ttl_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ToastMessage {
    pub(crate) fn new(input: ToastInput, ttl: Option<Duration>) -> Self {
        let created_at = Utc::now();
        let expires_at = ttl
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .and_then(|d| created_at.checked_add_signed(d));

        Self {
            id: ToastId::new(),
            kind: input.kind,
            title: input.title,
            body: input.body,
            ttl_ms: ttl.map(|d| d.as_millis() as u64),
            created_at,
            expires_at,
        }
    }
}

/// Options for a yes/no confirmation
#[derive(Debug, Clone)]
pub struct ConfirmOptions {
    title: Option<String>,
    body: String,
    confirm_label: Option<String>,
    cancel_label: Option<String>,
}

impl ConfirmOptions {
    pub fn new(body: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            title: None,
            body: require_body(body.into(), "confirmation")?,
            confirm_label: None,
            cancel_label: None,
        })
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// A confirmation as published to the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub id: ConfirmationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub body: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub requested_at: DateTime<Utc>,
}

impl ConfirmationRequest {
    pub(crate) fn new(options: ConfirmOptions, defaults: &ConfirmationConfig) -> Self {
        Self {
            id: ConfirmationId::new(),
            title: options.title,
            body: options.body,
            confirm_label: options
                .confirm_label
                .unwrap_or_else(|| defaults.confirm_label.clone()),
            cancel_label: options
                .cancel_label
                .unwrap_or_else(|| defaults.cancel_label.clone()),
            requested_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationsConfig;
    use crate::notification::NotificationManager;

    #[test]
    fn test_toast_input_rejects_blank_body() {
        assert_eq!(
            ToastInput::new("   ").unwrap_err(),
            NotifyError::EmptyBody { what: "toast" }
        );
        assert!(ToastInput::success("").is_err());
    }

    #[test]
    fn test_toast_input_builder() {
        let input = ToastInput::success("Tâche ajoutée")
            .unwrap()
            .title("Tâches")
            .ttl_ms(1500);

        assert_eq!(input.body(), "Tâche ajoutée");
        assert_eq!(input.requested_ttl(), Ttl::After(Duration::from_millis(1500)));

        let message = ToastMessage::new(input, Some(Duration::from_millis(1500)));
        assert_eq!(message.kind, ToastKind::Success);
        assert_eq!(message.title.as_deref(), Some("Tâches"));
        assert_eq!(message.ttl_ms, Some(1500));
        assert!(message.expires_at.is_some());
    }

    #[test]
    fn test_ttl_resolution() {
        let default = Duration::from_millis(4000);
        assert_eq!(Ttl::Default.resolve(default), Some(default));
        assert_eq!(Ttl::Never.resolve(default), None);
        assert_eq!(
            Ttl::After(Duration::from_millis(10)).resolve(default),
            Some(Duration::from_millis(10))
        );
        assert_eq!(Ttl::from_millis(None), Ttl::Never);
        assert_eq!(Ttl::from_millis(Some(250)), Ttl::After(Duration::from_millis(250)));
    }

    #[test]
    fn test_never_expiring_message_has_no_expiry() {
        let input = ToastInput::warning("Connexion perdue").unwrap().never_expire();
        let message = ToastMessage::new(input, None);
        assert_eq!(message.ttl_ms, None);
        assert_eq!(message.expires_at, None);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["kind"], "warning");
        assert!(json["ttl_ms"].is_null());
        assert!(json.get("expires_at").is_none());
    }

    #[test]
    fn test_confirmation_labels_default_from_config() {
        let defaults = ConfirmationConfig::default();
        let request = ConfirmationRequest::new(
            ConfirmOptions::new("Supprimer cette tâche ?").unwrap(),
            &defaults,
        );
        assert_eq!(request.confirm_label, "Confirmer");
        assert_eq!(request.cancel_label, "Annuler");

        let request = ConfirmationRequest::new(
            ConfirmOptions::new("Quitter le groupe ?")
                .unwrap()
                .confirm_label("Quitter"),
            &defaults,
        );
        assert_eq!(request.confirm_label, "Quitter");
        assert_eq!(request.cancel_label, "Annuler");
    }

    #[test]
    fn test_ids_round_trip_through_strings() {
        let id = ToastId::new();
        let parsed: ToastId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ConfirmationId>().is_err());
    }

    #[test]
    fn test_far_future_ttl_has_no_expiry_timestamp() {
        let input = ToastInput::new("long").unwrap();
        let message = ToastMessage::new(input, Some(Duration::from_millis(10_000_000_000_000_000)));

        assert_eq!(message.ttl_ms, Some(10_000_000_000_000_000));
        assert!(message.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_post_with_huge_ttl_does_not_panic() {
        let manager = NotificationManager::new(&NotificationsConfig::default()).unwrap();

        let huge = manager.post(ToastInput::new("énorme").unwrap().ttl_ms(u64::MAX / 2));
        let far = manager.post(ToastInput::new("lointain").unwrap().ttl_ms(10_000_000_000_000_000));

        let toasts = manager.toasts();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].id, far);
        assert_eq!(toasts[1].id, huge);
        assert!(toasts.iter().all(|t| t.expires_at.is_none()));
    }
}
