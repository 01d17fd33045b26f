//! Service layer for the gateway.
//!
//! Contains relay logic and external service integrations:
//! - Rooms (WebSocket broadcast grouping per namespace)
//! - Notifications (in-memory store + room-scoped push)
//! - Auction (bid forwarding to the external auction API)
//! - Chat (in-memory messages, presence, best-effort persistence)

mod auction;
mod chat;
mod notifications;
mod rooms;

pub use auction::AuctionService;
pub use chat::{start_inactivity_sweep, ChatService};
pub use notifications::{NotificationService, NotificationStore, ADMIN_ROOM};
pub use rooms::RoomRegistry;
