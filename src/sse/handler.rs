//! SSE handler implementation.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::notification::{ConfirmationRequest, ManagerEvent, NotificationManager, ToastMessage};
use crate::server::AppState;

/// Full view of what a renderer should display
#[derive(Debug, Clone, Serialize)]
pub struct NotificationSnapshot {
    /// Visible toasts, most recent first
    pub toasts: Vec<ToastMessage>,
    /// The confirmation dialog to show, if any
    pub confirmation: Option<ConfirmationRequest>,
    /// Confirmations waiting behind the shown one
    pub queued: usize,
}

impl NotificationSnapshot {
    pub fn capture(manager: &NotificationManager) -> Self {
        Self {
            toasts: manager.toasts(),
            confirmation: manager.pending_confirmation(),
            queued: manager.queued_confirmations(),
        }
    }
}

/// SSE stream of manager events
#[tracing::instrument(name = "sse.connect", skip(state))]
pub async fn sse_handler(State(state): State<AppState>) -> Response {
    let subscriber_id = Uuid::new_v4();

    // Subscribe before the snapshot so nothing falls in between
    let events = state.manager.subscribe();
    let snapshot = NotificationSnapshot::capture(&state.manager);

    tracing::info!(subscriber_id = %subscriber_id, "SSE subscriber connected");

    let stream = create_sse_stream(events, snapshot, state.manager.clone(), subscriber_id);

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(state.settings.sse.keep_alive_seconds))
                .text("keep-alive"),
        )
        .into_response()
}

fn snapshot_event(snapshot: &NotificationSnapshot) -> Event {
    match serde_json::to_string(snapshot) {
        Ok(json) => Event::default().event("snapshot").data(json),
        Err(e) => serialization_error(e),
    }
}

fn serialization_error(e: serde_json::Error) -> Event {
    tracing::error!(error = %e, "Failed to serialize SSE event");
    Event::default()
        .event("error")
        .data(error_payload("SERIALIZATION_ERROR", &e.to_string()))
}

fn error_payload(code: &str, message: &str) -> String {
    serde_json::json!({ "code": code, "message": message }).to_string()
}

/// Create the SSE event stream: a snapshot, then every event until `closed`
fn create_sse_stream(
    mut events: broadcast::Receiver<ManagerEvent>,
    snapshot: NotificationSnapshot,
    manager: Arc<NotificationManager>,
    subscriber_id: Uuid,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let guard = CleanupGuard::new(subscriber_id);

    async_stream::stream! {
        let _guard = guard;

        yield Ok(snapshot_event(&snapshot));

        loop {
            match events.recv().await {
                Ok(event) => {
                    let closed = event == ManagerEvent::Closed;
                    yield Ok(match event.to_json() {
                        Ok(json) => Event::default().event(event.name()).data(json),
                        Err(e) => serialization_error(e),
                    });
                    if closed {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Individual events were lost; resynchronise with a full view
                    tracing::warn!(
                        subscriber_id = %subscriber_id,
                        skipped = skipped,
                        "SSE subscriber lagged, sending fresh snapshot"
                    );
                    yield Ok(snapshot_event(&NotificationSnapshot::capture(&manager)));
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Logs the disconnect when the stream is dropped
struct CleanupGuard {
    subscriber_id: Uuid,
    connected_at: Instant,
}

impl CleanupGuard {
    fn new(subscriber_id: Uuid) -> Self {
        Self {
            subscriber_id,
            connected_at: Instant::now(),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        tracing::info!(
            subscriber_id = %self.subscriber_id,
            duration_secs = self.connected_at.elapsed().as_secs_f64(),
            "SSE subscriber disconnected"
        );
    }
}
