//! Chat namespace.
//!
//! Routes:
//! - GET /ws/chat - WebSocket upgrade (requires `username` query param)
//!
//! Client→server: `sendMessage { recipient?, content, type? }`,
//! `getHistory { withUser? }`, `getOnlineUsers`, `clearHistory`.
//! Server→client: `newMessage`, `chatHistory { messages }`,
//! `onlineUsers { users }`, `historyCleared { removed }`,
//! `userJoined { user }`, `userLeft { user }`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::api::status;
use crate::models::{new_socket_id, ChatMessage, ChatMessageType, Frame};
use crate::AppState;

/// Build the chat namespace routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws/chat", get(chat_socket))
}

#[derive(Debug, Deserialize)]
struct ChatQuery {
    username: String,
}

/// Per-connection chat context.
#[derive(Debug, Clone)]
pub struct ChatCtx {
    pub socket_id: String,
    pub username: String,
}

async fn chat_socket(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let ctx = ChatCtx {
        socket_id: new_socket_id(),
        username: query.username,
    };
    ws.on_upgrade(move |socket| handle_connection(state, socket, ctx))
}

async fn handle_connection(state: AppState, socket: WebSocket, ctx: ChatCtx) {
    info!(socket_id = %ctx.socket_id, username = %ctx.username, "chat socket connected");

    let mut outbound = state.chat_rooms.register(&ctx.socket_id).await;
    // Per-user room so private messages can target a username that may
    // hold several sockets.
    state.chat_rooms.join(&ctx.username, &ctx.socket_id).await;

    let user = state.chat.add_online(&ctx.username, &ctx.socket_id).await;
    state
        .chat_rooms
        .broadcast(Frame::new("userJoined", &json!({ "user": user })))
        .await;

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
                    debug!(socket_id = %ctx.socket_id, "ignoring malformed chat frame");
                    continue;
                };
                handle_frame(&state, &ctx, frame).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.chat_rooms.unregister(&ctx.socket_id).await;
    pump.abort();
    if let Some(user) = state.chat.remove_by_socket(&ctx.socket_id).await {
        state
            .chat_rooms
            .broadcast(Frame::new("userLeft", &json!({ "user": user })))
            .await;
    }
    info!(socket_id = %ctx.socket_id, username = %ctx.username, "chat socket disconnected");
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessage {
    #[serde(default)]
    recipient: Option<String>,
    content: String,
    #[serde(rename = "type", default = "default_message_type")]
    message_type: ChatMessageType,
}

fn default_message_type() -> ChatMessageType {
    ChatMessageType::Chat
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetHistory {
    #[serde(default)]
    with_user: Option<String>,
}

/// Dispatch one inbound chat frame.
///
/// Public so integration tests can drive the relay without a live
/// WebSocket connection.
pub async fn handle_frame(state: &AppState, ctx: &ChatCtx, frame: Frame) {
    match frame.event.as_str() {
        "sendMessage" => {
            let Some(payload) = frame.data_as::<SendMessage>() else {
                debug!(socket_id = %ctx.socket_id, "sendMessage payload malformed");
                return;
            };
            let message = ChatMessage {
                sender: ctx.username.clone(),
                recipient: payload.recipient,
                content: payload.content,
                message_type: payload.message_type,
                timestamp: crate::models::now(),
            };
            state.chat.save_message(message.clone()).await;

            let reply = Frame::new("newMessage", &message);
            match &message.recipient {
                Some(recipient) => {
                    // Private: recipient's sockets plus the sender's echo.
                    state.chat_rooms.emit_to_room(recipient, reply.clone()).await;
                    if recipient != &ctx.username {
                        state.chat_rooms.emit_to_room(&ctx.username, reply).await;
                    }
                }
                None => {
                    state.chat_rooms.broadcast(reply).await;
                }
            }
            status::inc_messages_relayed();
        }
        "getHistory" => {
            let with_user = frame
                .data_as::<GetHistory>()
                .and_then(|payload| payload.with_user);
            let messages = state.chat.history(&ctx.username, with_user.as_deref()).await;
            state
                .chat_rooms
                .emit_to(
                    &ctx.socket_id,
                    Frame::new("chatHistory", &json!({ "messages": messages })),
                )
                .await;
        }
        "clearHistory" => {
            // In-memory only; the external store is untouched.
            let removed = state.chat.clear_messages_for(&ctx.username).await;
            state
                .chat_rooms
                .emit_to(
                    &ctx.socket_id,
                    Frame::new("historyCleared", &json!({ "removed": removed })),
                )
                .await;
        }
        "getOnlineUsers" => {
            let users = state.chat.online_users().await;
            state
                .chat_rooms
                .emit_to(
                    &ctx.socket_id,
                    Frame::new("onlineUsers", &json!({ "users": users })),
                )
                .await;
        }
        other => debug!(socket_id = %ctx.socket_id, event = other, "ignoring unknown chat event"),
    }
}
