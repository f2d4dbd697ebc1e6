// Core
pub mod notification;

// Supporting modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Rendering adapter (HTTP + SSE)
pub mod api;
pub mod server;
pub mod sse;

pub mod shutdown;
