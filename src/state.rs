//! Application state for the gateway.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;

use crate::config::{self, Config};
use crate::services::{AuctionService, ChatService, NotificationService, RoomRegistry};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Auction bidding API client.
    pub auction: Arc<AuctionService>,
    /// Chat relay with in-memory messages and presence.
    pub chat: Arc<ChatService>,
    /// Notification store and room-scoped push.
    pub notifier: Arc<NotificationService>,
    /// Room registry for the bidding namespace.
    pub bidding_rooms: Arc<RoomRegistry>,
    /// Room registry for the chat namespace.
    pub chat_rooms: Arc<RoomRegistry>,
}

impl AppState {
    /// Create the application state from the global configuration.
    pub fn new() -> Self {
        Self::from_config(config::config())
    }

    /// Create the application state from an explicit configuration.
    /// Used by integration tests to point at mock upstreams.
    pub fn from_config(config: &Config) -> Self {
        let notification_rooms = Arc::new(RoomRegistry::new());

        Self {
            auction: Arc::new(AuctionService::new(&config.auction_api)),
            chat: Arc::new(ChatService::new(&config.chat_api)),
            notifier: Arc::new(NotificationService::new(notification_rooms)),
            bidding_rooms: Arc::new(RoomRegistry::new()),
            chat_rooms: Arc::new(RoomRegistry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
