//! Bidding relay namespace.
//!
//! Routes:
//! - GET /ws/bidding - WebSocket upgrade
//!
//! Client→server: `placeBid { auctionId, amount }`.
//! Server→client: `bidding_update { success, message, auctionId,
//! newHighestBid?, highestBidderName? }` - broadcast to every bidding
//! socket on success, emitted only to the bidder on failure.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::header;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::status;
use crate::models::{new_socket_id, Frame, PlaceBid};
use crate::AppState;

/// Build the bidding namespace routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws/bidding", get(bidding_socket))
}

#[derive(Debug, Deserialize)]
struct BiddingQuery {
    /// Bearer token fallback for browsers that cannot set headers on
    /// WebSocket upgrades.
    token: Option<String>,
}

/// WebSocket upgrade for the bidding namespace.
///
/// The caller's bearer token (Authorization header or `token` query
/// parameter) is captured here and passed through to the auction API
/// verbatim; the gateway never inspects it.
async fn bidding_socket(
    State(state): State<AppState>,
    Query(query): Query<BiddingQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
        .or(query.token);

    ws.on_upgrade(move |socket| handle_connection(state, socket, bearer_token))
}

async fn handle_connection(state: AppState, socket: WebSocket, bearer_token: Option<String>) {
    let socket_id = new_socket_id();
    info!(socket_id, "bidding socket connected");

    let mut outbound = state.bidding_rooms.register(&socket_id).await;
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
                    debug!(socket_id, "ignoring malformed bidding frame");
                    continue;
                };
                handle_frame(&state, &socket_id, bearer_token.as_deref(), frame).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.bidding_rooms.unregister(&socket_id).await;
    pump.abort();
    info!(socket_id, "bidding socket disconnected");
}

/// Dispatch one inbound bidding frame.
///
/// Public so integration tests can drive the relay without a live
/// WebSocket connection.
pub async fn handle_frame(
    state: &AppState,
    socket_id: &str,
    bearer_token: Option<&str>,
    frame: Frame,
) {
    match frame.event.as_str() {
        "placeBid" => {
            let Some(bid) = frame.data_as::<PlaceBid>() else {
                debug!(socket_id, "placeBid payload malformed, ignoring");
                return;
            };
            let update = state.auction.place_bid(&bid, bearer_token).await;
            let reply = Frame::new("bidding_update", &update);
            if update.success {
                // Every connected bidding socket sees the new highest
                // bid, not just watchers of this auction.
                state.bidding_rooms.broadcast(reply).await;
                status::inc_bids_relayed();
            } else {
                state.bidding_rooms.emit_to(socket_id, reply).await;
            }
        }
        other => debug!(socket_id, event = other, "ignoring unknown bidding event"),
    }
}
