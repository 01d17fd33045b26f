//! Notification store and room-scoped push.
//!
//! The store is an unbounded in-process list with a counter for ids,
//! matching the external backend's expectation that the gateway only
//! relays: records are lost on restart and never evicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::models::{Frame, NewNotification, Notification, NotificationCategory};
use crate::services::RoomRegistry;

/// Room joined by every socket whose handshake roles include admin.
pub const ADMIN_ROOM: &str = "admin";

/// In-memory notification store.
pub struct NotificationStore {
    records: RwLock<Vec<Notification>>,
    next_id: AtomicU64,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a notification from a payload and append it to the store.
    pub async fn create(&self, payload: NewNotification) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            user_id: payload.user_id,
            message: payload.message,
            category: payload.category,
            is_read: false,
            link: payload.link,
            created_at: crate::models::now(),
        };
        self.records.write().await.push(notification.clone());
        notification
    }

    /// All notifications visible to a user, newest first.
    ///
    /// Admins see the union of their own notifications and every
    /// ADMIN-category notification, de-duplicated by id.
    pub async fn find_all_for(&self, user_id: i64, is_admin: bool) -> Vec<Notification> {
        let records = self.records.read().await;
        let mut seen = std::collections::HashSet::new();
        let mut result: Vec<Notification> = records
            .iter()
            .filter(|n| {
                n.user_id == user_id
                    || (is_admin && n.category == NotificationCategory::Admin)
            })
            .filter(|n| seen.insert(n.id))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        result
    }

    /// Look up a single notification, scoped to what the caller may see.
    pub async fn find_one(&self, id: u64, user_id: i64, is_admin: bool) -> Option<Notification> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|n| {
                n.id == id
                    && (n.user_id == user_id
                        || (is_admin && n.category == NotificationCategory::Admin))
            })
            .cloned()
    }

    /// Flip `isRead` on the caller's matching record. Unknown or foreign
    /// ids are ignored.
    pub async fn mark_as_read(&self, id: u64, user_id: i64) -> Option<Notification> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)?;
        record.is_read = true;
        Some(record.clone())
    }

    /// Mark every record of the caller read. Idempotent; returns how
    /// many records were flipped this call.
    pub async fn mark_all_as_read(&self, user_id: i64) -> usize {
        let mut records = self.records.write().await;
        let mut flipped = 0;
        for record in records.iter_mut().filter(|n| n.user_id == user_id) {
            if !record.is_read {
                record.is_read = true;
                flipped += 1;
            }
        }
        flipped
    }

    pub async fn unread_count(&self, user_id: i64) -> usize {
        let records = self.records.read().await;
        records
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification relay: store plus the notification namespace's rooms.
pub struct NotificationService {
    pub store: NotificationStore,
    pub rooms: Arc<RoomRegistry>,
}

impl NotificationService {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self {
            store: NotificationStore::new(),
            rooms,
        }
    }

    /// Create a notification and broadcast `newNotification` to every
    /// connected socket on the namespace.
    pub async fn create_and_broadcast(&self, payload: NewNotification) -> Notification {
        let notification = self.store.create(payload).await;
        let reached = self
            .rooms
            .broadcast(Frame::new("newNotification", &notification))
            .await;
        info!(
            id = notification.id,
            user_id = notification.user_id,
            reached,
            "notification created and broadcast"
        );
        notification
    }

    /// Push an already-persisted notification to one user's room.
    pub async fn send_to_user(&self, user_id: i64, notification: &Notification) -> usize {
        self.rooms
            .emit_to_room(&user_id.to_string(), Frame::new("newNotification", notification))
            .await
    }

    /// Push an already-persisted notification to the admin room.
    pub async fn send_to_admin_group(&self, notification: &Notification) -> usize {
        self.rooms
            .emit_to_room(ADMIN_ROOM, Frame::new("newNotification", notification))
            .await
    }
}
