use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::ManagerStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub notifications: ManagerStatsSnapshot,
    /// Connected event subscribers (SSE renderers)
    pub subscribers: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.manager.is_closed() {
        "shutting_down"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        notifications: state.manager.stats(),
        subscribers: state.manager.subscriber_count(),
    })
}
