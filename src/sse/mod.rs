//! Server-Sent Events stream for rendering adapters.
//!
//! A browser renderer connects once and mirrors the manager: it draws the
//! initial `snapshot`, then applies each event as it arrives.
//!
//! # Endpoint
//!
//! `GET /api/v1/events`
//!
//! # Event Types
//!
//! - `snapshot` - Full view `{toasts, confirmation, queued}`, sent first and
//!   again whenever the subscriber lagged behind
//! - `toast_posted`, `toast_dismissed`
//! - `confirmation_opened`, `confirmation_queued`, `confirmation_settled`
//! - `closed` - The manager shut down; the stream ends after it

mod handler;

pub use handler::{sse_handler, NotificationSnapshot};
