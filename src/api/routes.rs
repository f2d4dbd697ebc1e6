use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::server::AppState;
use crate::sse::sse_handler;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::notifications::{
    cancel_confirmation, dismiss_toast, list_notifications, post_toast, resolve_confirmation,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, Stats & Metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                .route("/notifications", get(list_notifications))
                .route("/events", get(sse_handler))
                // Toasts
                .route("/toasts", post(post_toast))
                .route("/toasts/{id}", delete(dismiss_toast))
                // Confirmations
                .route("/confirmations/cancel", post(cancel_confirmation))
                .route("/confirmations/{id}/resolve", post(resolve_confirmation)),
        )
}
