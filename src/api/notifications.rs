//! Notification relay namespace and HTTP push triggers.
//!
//! Routes:
//! - GET /ws/notifications - WebSocket upgrade
//! - POST /api/notifications/create - push an already-persisted
//!   notification to its user's room
//! - POST /api/notifications/admin/create - push to the admin room
//!
//! Handshake claims (`userId`, `roles` query parameters) are trusted
//! without revalidation; room membership is rebuilt from them on every
//! reconnect.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::api::status;
use crate::models::{new_socket_id, Frame, NewNotification, Notification};
use crate::services::ADMIN_ROOM;
use crate::{AppState, Result};

/// Build the notification namespace routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws/notifications", get(notification_socket))
}

/// Build the HTTP trigger routes used by the external backend.
pub fn trigger_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/create", post(push_to_user))
        .route("/api/notifications/admin/create", post(push_to_admins))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationQuery {
    #[serde(default)]
    user_id: i64,
    #[serde(default)]
    roles: String,
}

/// Per-connection context derived from handshake claims.
#[derive(Debug, Clone)]
pub struct ConnectionCtx {
    pub socket_id: String,
    pub user_id: i64,
    pub is_admin: bool,
}

/// True if a comma-separated roles claim grants admin membership.
/// Accepts `ADMIN` and `ROLE_ADMIN`, case-insensitive.
fn is_admin_role(roles: &str) -> bool {
    roles.split(',').any(|role| {
        let role = role.trim();
        role.eq_ignore_ascii_case("admin") || role.eq_ignore_ascii_case("role_admin")
    })
}

async fn notification_socket(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let ctx = ConnectionCtx {
        socket_id: new_socket_id(),
        user_id: query.user_id,
        is_admin: is_admin_role(&query.roles),
    };
    ws.on_upgrade(move |socket| handle_connection(state, socket, ctx))
}

async fn handle_connection(state: AppState, socket: WebSocket, ctx: ConnectionCtx) {
    info!(
        socket_id = %ctx.socket_id,
        user_id = ctx.user_id,
        is_admin = ctx.is_admin,
        "notification socket connected"
    );

    let rooms = &state.notifier.rooms;
    let mut outbound = rooms.register(&ctx.socket_id).await;
    rooms.join(&ctx.user_id.to_string(), &ctx.socket_id).await;
    if ctx.is_admin {
        rooms.join(ADMIN_ROOM, &ctx.socket_id).await;
    }

    let (mut sink, mut stream) = socket.split();
    let pump = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.to_text())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let Some(frame) = Frame::parse(&text) else {
                    debug!(socket_id = %ctx.socket_id, "ignoring malformed notification frame");
                    continue;
                };
                handle_frame(&state, &ctx, frame).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.notifier.rooms.unregister(&ctx.socket_id).await;
    pump.abort();
    info!(socket_id = %ctx.socket_id, "notification socket disconnected");
}

#[derive(Debug, Deserialize)]
struct IdPayload {
    id: u64,
}

/// Dispatch one inbound notification frame.
///
/// Public so integration tests can drive the relay without a live
/// WebSocket connection.
pub async fn handle_frame(state: &AppState, ctx: &ConnectionCtx, frame: Frame) {
    let notifier = &state.notifier;
    match frame.event.as_str() {
        "createNotification" => {
            let Some(payload) = frame.data_as::<NewNotification>() else {
                debug!(socket_id = %ctx.socket_id, "createNotification payload malformed");
                return;
            };
            notifier.create_and_broadcast(payload).await;
            status::inc_notifications_pushed();
        }
        "findAllNotifications" => {
            send_notification_list(state, ctx).await;
        }
        "findOneNotification" => {
            let Some(IdPayload { id }) = frame.data_as() else {
                return;
            };
            let notification = notifier
                .store
                .find_one(id, ctx.user_id, ctx.is_admin)
                .await;
            notifier
                .rooms
                .emit_to(
                    &ctx.socket_id,
                    Frame::new("notification", &json!({ "notification": notification })),
                )
                .await;
        }
        "markAsRead" => {
            let Some(IdPayload { id }) = frame.data_as() else {
                return;
            };
            // Unknown and foreign ids fall through silently; the
            // refreshed list is the reply either way.
            notifier.store.mark_as_read(id, ctx.user_id).await;
            send_notification_list(state, ctx).await;
        }
        "markAllAsRead" => {
            notifier.store.mark_all_as_read(ctx.user_id).await;
            send_notification_list(state, ctx).await;
        }
        other => {
            debug!(socket_id = %ctx.socket_id, event = other, "ignoring unknown notification event");
        }
    }
}

/// Emit the caller's current notification list to the caller only.
async fn send_notification_list(state: &AppState, ctx: &ConnectionCtx) {
    let notifications = state
        .notifier
        .store
        .find_all_for(ctx.user_id, ctx.is_admin)
        .await;
    state
        .notifier
        .rooms
        .emit_to(
            &ctx.socket_id,
            Frame::new("notifications", &json!({ "notifications": notifications })),
        )
        .await;
}

/// POST /api/notifications/create
///
/// The payload was already persisted by the external backend; the
/// gateway only relays it to the user's room.
async fn push_to_user(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> Result<Json<serde_json::Value>> {
    let reached = state
        .notifier
        .send_to_user(notification.user_id, &notification)
        .await;
    status::inc_notifications_pushed();
    info!(
        id = notification.id,
        user_id = notification.user_id,
        reached,
        "notification pushed to user room"
    );
    Ok(Json(json!({ "delivered": reached > 0 })))
}

/// POST /api/notifications/admin/create
async fn push_to_admins(
    State(state): State<AppState>,
    Json(notification): Json<Notification>,
) -> Result<Json<serde_json::Value>> {
    let reached = state.notifier.send_to_admin_group(&notification).await;
    status::inc_notifications_pushed();
    info!(id = notification.id, reached, "notification pushed to admin room");
    Ok(Json(json!({ "delivered": reached > 0 })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_detection() {
        assert!(is_admin_role("ADMIN"));
        assert!(is_admin_role("ROLE_ADMIN"));
        assert!(is_admin_role("user, admin"));
        assert!(!is_admin_role("USER"));
        assert!(!is_admin_role(""));
        assert!(!is_admin_role("administrator"));
    }
}
