//! Toast and confirmation endpoints used by the web renderer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::notification::{ConfirmationId, NotifyError, ToastId, ToastInput, ToastKind, Ttl};
use crate::server::AppState;
use crate::sse::NotificationSnapshot;

/// Body of `POST /api/v1/toasts`.
///
/// `ttl_ms` omitted means the default TTL; `null` means the toast never
/// expires.
#[derive(Debug, Deserialize)]
pub struct PostToastRequest {
    #[serde(default)]
    pub kind: ToastKind,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub ttl_ms: Option<Option<u64>>,
}

fn deserialize_ttl<'de, D>(deserializer: D) -> std::result::Result<Option<Option<u64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(Some)
}

impl PostToastRequest {
    pub fn into_input(self) -> std::result::Result<ToastInput, NotifyError> {
        let mut input = ToastInput::new(self.body)?.kind(self.kind);
        if let Some(title) = self.title {
            input = input.title(title);
        }
        if let Some(ttl_ms) = self.ttl_ms {
            input = input.ttl(Ttl::from_millis(ttl_ms));
        }
        Ok(input)
    }
}

#[derive(Debug, Serialize)]
pub struct PostToastResponse {
    pub id: ToastId,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub confirmed: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SettlementResponse {
    /// Whether a confirmation was actually settled
    pub applied: bool,
}

/// GET /api/v1/notifications
pub async fn list_notifications(State(state): State<AppState>) -> Json<NotificationSnapshot> {
    Json(NotificationSnapshot::capture(&state.manager))
}

/// POST /api/v1/toasts
pub async fn post_toast(
    State(state): State<AppState>,
    Json(request): Json<PostToastRequest>,
) -> Result<(StatusCode, Json<PostToastResponse>)> {
    // Checked at insertion, so a shutdown racing this request still yields 503
    let id = state.manager.try_post(request.into_input()?)?;
    Ok((StatusCode::CREATED, Json(PostToastResponse { id })))
}

/// DELETE /api/v1/toasts/{id}
pub async fn dismiss_toast(State(state): State<AppState>, Path(id): Path<ToastId>) -> StatusCode {
    state.manager.dismiss(id);
    StatusCode::NO_CONTENT
}

/// POST /api/v1/confirmations/{id}/resolve
pub async fn resolve_confirmation(
    State(state): State<AppState>,
    Path(id): Path<ConfirmationId>,
    Json(request): Json<ResolveRequest>,
) -> Json<SettlementResponse> {
    let applied = state.manager.resolve_confirmation(id, request.confirmed);
    Json(SettlementResponse { applied })
}

/// POST /api/v1/confirmations/cancel
pub async fn cancel_confirmation(State(state): State<AppState>) -> Json<SettlementResponse> {
    let applied = state.manager.cancel_confirmation();
    Json(SettlementResponse { applied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::AppError;
    use crate::notification::{ConfirmOptions, NotificationManager};
    use std::sync::Arc;
    use std::time::Duration;

    fn create_state() -> AppState {
        let settings: Settings = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let manager = Arc::new(NotificationManager::new(&settings.notifications).unwrap());
        AppState::with_manager(settings, manager)
    }

    fn parse(json: &str) -> PostToastRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_ttl_omitted_null_and_explicit() {
        let omitted = parse(r#"{"body":"a"}"#).into_input().unwrap();
        assert_eq!(omitted.requested_ttl(), Ttl::Default);

        let never = parse(r#"{"body":"a","ttl_ms":null}"#).into_input().unwrap();
        assert_eq!(never.requested_ttl(), Ttl::Never);

        let explicit = parse(r#"{"body":"a","ttl_ms":1200}"#).into_input().unwrap();
        assert_eq!(explicit.requested_ttl(), Ttl::After(Duration::from_millis(1200)));
    }

    #[test]
    fn test_missing_body_is_rejected() {
        assert!(serde_json::from_str::<PostToastRequest>(r#"{"kind":"success"}"#).is_err());
        assert!(matches!(
            parse(r#"{"body":""}"#).into_input(),
            Err(NotifyError::EmptyBody { .. })
        ));
    }

    #[tokio::test]
    async fn test_post_list_and_dismiss() {
        let state = create_state();

        let (status, Json(posted)) = post_toast(
            State(state.clone()),
            Json(parse(r#"{"kind":"success","body":"Tâche ajoutée"}"#)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(snapshot) = list_notifications(State(state.clone())).await;
        assert_eq!(snapshot.toasts.len(), 1);
        assert_eq!(snapshot.toasts[0].id, posted.id);
        assert_eq!(snapshot.toasts[0].kind, ToastKind::Success);

        let status = dismiss_toast(State(state.clone()), Path(posted.id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        // Idempotent
        let status = dismiss_toast(State(state.clone()), Path(posted.id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.manager.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_and_stale_resolve() {
        let state = create_state();
        let pending = state
            .manager
            .request(ConfirmOptions::new("Supprimer cette tâche ?").unwrap())
            .unwrap();
        let id = pending.id();

        let Json(first) = resolve_confirmation(
            State(state.clone()),
            Path(id),
            Json(ResolveRequest { confirmed: true }),
        )
        .await;
        assert_eq!(first, SettlementResponse { applied: true });
        assert!(pending.await);

        let Json(second) = resolve_confirmation(
            State(state.clone()),
            Path(id),
            Json(ResolveRequest { confirmed: false }),
        )
        .await;
        assert_eq!(second, SettlementResponse { applied: false });
    }

    #[tokio::test]
    async fn test_cancel_confirmation() {
        let state = create_state();
        let pending = state
            .manager
            .request(ConfirmOptions::new("Quitter le groupe ?").unwrap())
            .unwrap();

        let Json(response) = cancel_confirmation(State(state.clone())).await;
        assert!(response.applied);
        assert!(!pending.await);
    }

    #[tokio::test]
    async fn test_post_after_shutdown_fails() {
        let state = create_state();
        state.manager.shutdown();

        let result = post_toast(State(state), Json(parse(r#"{"body":"trop tard"}"#))).await;
        assert!(matches!(result, Err(AppError::Notify(NotifyError::Closed))));
    }
}
