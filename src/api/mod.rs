//! API layer - HTTP endpoints of the rendering adapter.

mod health;
mod metrics;
mod notifications;
mod routes;

pub use health::{health, stats, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use notifications::{
    cancel_confirmation, dismiss_toast, list_notifications, post_toast, resolve_confirmation,
    PostToastRequest, PostToastResponse, ResolveRequest, SettlementResponse,
};
pub use routes::api_routes;
