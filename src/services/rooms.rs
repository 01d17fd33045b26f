//! Room registry for WebSocket broadcast grouping.
//!
//! Each namespace (bidding, notifications, chat) owns one registry.
//! Connections register an unbounded outbound queue; rooms scope emits
//! to subsets of connections (per-user rooms, the `admin` room), and
//! whole-namespace broadcast reaches every registered socket.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::Frame;

/// Broadcast-grouping registry for one WebSocket namespace.
///
/// Membership is rebuilt from handshake claims on every reconnect; a
/// closed connection is pruned lazily on the next emit that hits it.
#[derive(Default)]
pub struct RoomRegistry {
    connections: RwLock<HashMap<String, UnboundedSender<Frame>>>,
    rooms: RwLock<HashMap<String, HashSet<String>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and hand back its outbound queue.
    pub async fn register(&self, socket_id: &str) -> UnboundedReceiver<Frame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .write()
            .await
            .insert(socket_id.to_string(), tx);
        rx
    }

    /// Remove a connection and its room memberships.
    pub async fn unregister(&self, socket_id: &str) {
        self.connections.write().await.remove(socket_id);
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(socket_id);
            !members.is_empty()
        });
    }

    /// Add a connection to a room, creating the room if needed.
    pub async fn join(&self, room: &str, socket_id: &str) {
        self.rooms
            .write()
            .await
            .entry(room.to_string())
            .or_default()
            .insert(socket_id.to_string());
        debug!(room, socket_id, "socket joined room");
    }

    /// Emit a frame to a single connection. Returns false if the
    /// connection is gone.
    pub async fn emit_to(&self, socket_id: &str, frame: Frame) -> bool {
        let delivered = {
            let connections = self.connections.read().await;
            match connections.get(socket_id) {
                Some(tx) => tx.send(frame).is_ok(),
                None => false,
            }
        };
        if !delivered {
            self.unregister(socket_id).await;
        }
        delivered
    }

    /// Emit a frame to every member of a room. An empty or unknown room
    /// is a no-op. Returns the number of sockets reached.
    pub async fn emit_to_room(&self, room: &str, frame: Frame) -> usize {
        let members: Vec<String> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(members) => members.iter().cloned().collect(),
                None => return 0,
            }
        };
        self.send_to_members(&members, frame).await
    }

    /// Emit a frame to every registered connection in this namespace.
    pub async fn broadcast(&self, frame: Frame) -> usize {
        let members: Vec<String> = {
            let connections = self.connections.read().await;
            connections.keys().cloned().collect()
        };
        self.send_to_members(&members, frame).await
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    async fn send_to_members(&self, members: &[String], frame: Frame) -> usize {
        let mut dead = Vec::new();
        let mut delivered = 0;
        {
            let connections = self.connections.read().await;
            for socket_id in members {
                match connections.get(socket_id) {
                    Some(tx) if tx.send(frame.clone()).is_ok() => delivered += 1,
                    Some(_) => dead.push(socket_id.clone()),
                    None => {}
                }
            }
        }
        for socket_id in dead {
            self.unregister(&socket_id).await;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(event: &str) -> Frame {
        Frame::new(event, &json!({}))
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_connections() {
        let registry = RoomRegistry::new();
        let mut rx1 = registry.register("s1").await;
        let mut rx2 = registry.register("s2").await;

        let delivered = registry.broadcast(frame("bidding_update")).await;
        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.unwrap().event, "bidding_update");
        assert_eq!(rx2.recv().await.unwrap().event, "bidding_update");
    }

    #[tokio::test]
    async fn test_room_emit_is_scoped() {
        let registry = RoomRegistry::new();
        let mut rx1 = registry.register("s1").await;
        let mut rx2 = registry.register("s2").await;
        registry.join("7", "s1").await;

        let delivered = registry.emit_to_room("7", frame("newNotification")).await;
        assert_eq!(delivered, 1);
        assert_eq!(rx1.recv().await.unwrap().event, "newNotification");
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_room_is_noop() {
        let registry = RoomRegistry::new();
        let _rx = registry.register("s1").await;
        assert_eq!(registry.emit_to_room("admin", frame("x")).await, 0);
    }

    #[tokio::test]
    async fn test_unregister_prunes_rooms() {
        let registry = RoomRegistry::new();
        let _rx = registry.register("s1").await;
        registry.join("admin", "s1").await;
        registry.unregister("s1").await;

        assert_eq!(registry.connection_count().await, 0);
        assert_eq!(registry.emit_to_room("admin", frame("x")).await, 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_pruned_on_emit() {
        let registry = RoomRegistry::new();
        let rx = registry.register("s1").await;
        drop(rx);

        assert_eq!(registry.broadcast(frame("x")).await, 0);
        assert_eq!(registry.connection_count().await, 0);
    }
}
