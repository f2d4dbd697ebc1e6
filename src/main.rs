use anyhow::Result;
use tokio::net::TcpListener;

use ara_notification_manager::config::Settings;
use ara_notification_manager::server::{create_app, AppState};
use ara_notification_manager::shutdown::{wait_for_signal, GracefulShutdown};
use ara_notification_manager::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    init_telemetry(&settings.logging)?;
    tracing::info!("Configuration loaded");

    // One manager for the whole process, shared by reference
    let state = AppState::new(settings.clone())?;
    tracing::info!("Application state initialized");

    let app = create_app(state.clone());

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Tearing the manager down ends every SSE stream, letting the server drain
    let shutdown_manager = state.manager.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            GracefulShutdown::new(shutdown_manager)
                .execute("server shutdown")
                .await;
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
