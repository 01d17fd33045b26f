//! Data models for the gateway.
//!
//! Defines the wire-level types relayed between browser clients and the
//! external backend: bids, notifications, chat messages, and the JSON
//! frame envelope used on every WebSocket namespace.

mod bid;
mod chat;
mod frame;
mod notification;

pub use bid::*;
pub use chat::*;
pub use frame::*;
pub use notification::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new socket id
pub fn new_socket_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
