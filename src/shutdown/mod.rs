//! Graceful shutdown handling.
//!
//! On shutdown the notification manager is torn down first, which cancels
//! outstanding confirmations and publishes a `closed` event that ends every
//! SSE stream. We then wait briefly for those streams to disconnect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::signal;
use tokio::time::timeout;

use crate::notification::{NotificationManager, ShutdownReport};

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for event subscribers to disconnect (default: 5 seconds)
    pub drain_timeout: Duration,
    /// How often subscriber count is polled while draining
    pub poll_interval: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Tears down the notification manager and waits for subscribers to leave
pub struct GracefulShutdown {
    manager: Arc<NotificationManager>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(manager: Arc<NotificationManager>) -> Self {
        Self::with_config(manager, ShutdownConfig::default())
    }

    pub fn with_config(manager: Arc<NotificationManager>, config: ShutdownConfig) -> Self {
        Self { manager, config }
    }

    /// Execute graceful shutdown sequence
    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(subscribers = self.manager.subscriber_count())
    )]
    pub async fn execute(&self, reason: &str) -> ShutdownResult {
        let start = Instant::now();

        tracing::info!(reason = %reason, "Starting graceful shutdown - Phase 1: Closing notification manager");
        let report = self.manager.shutdown();

        tracing::info!("Phase 2: Waiting for event subscribers to disconnect");
        let subscribers_remaining = self.wait_for_subscribers().await;

        let result = ShutdownResult {
            report,
            subscribers_remaining,
            duration: start.elapsed(),
        };

        tracing::info!(
            toasts_cleared = result.report.toasts_cleared,
            confirmations_cancelled = result.report.confirmations_cancelled,
            subscribers_remaining = result.subscribers_remaining,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );

        result
    }

    async fn wait_for_subscribers(&self) -> usize {
        let wait_future = async {
            while self.manager.subscriber_count() > 0 {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        };

        if timeout(self.config.drain_timeout, wait_future).await.is_err() {
            tracing::warn!(
                remaining = self.manager.subscriber_count(),
                "Some event subscribers did not disconnect in time"
            );
        }

        self.manager.subscriber_count()
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    pub report: ShutdownReport,
    /// Event subscribers still attached when we gave up waiting
    pub subscribers_remaining: usize,
    pub duration: Duration,
}

/// Resolve when the process receives Ctrl+C or SIGTERM
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
