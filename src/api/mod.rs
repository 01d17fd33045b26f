//! API routes for the gateway.
//!
//! This module combines all routes into a single router.
//!
//! Route structure:
//! - /ws/bidding - Bidding relay namespace (WebSocket)
//! - /ws/notifications - Notification relay namespace (WebSocket)
//! - /ws/chat - Chat namespace (WebSocket)
//! - /api/notifications/* - HTTP push triggers from the backend
//! - /health, /status - Health checks (public)

pub mod bidding;
pub mod chat;
pub mod notifications;
pub mod status;

use axum::Router;

use crate::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health and status endpoints (public)
        .merge(status::routes())
        // WebSocket namespaces
        .merge(bidding::routes())
        .merge(notifications::routes())
        .merge(chat::routes())
        // HTTP push triggers (called by the external backend)
        .merge(notifications::trigger_routes())
}
