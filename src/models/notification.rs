//! Notification records and creation payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification held in the in-process store.
///
/// Ids come from a single process-local counter; records are never
/// persisted by the gateway and are lost on restart. The external
/// backend remains the durable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub user_id: i64,
    pub message: String,
    pub category: NotificationCategory,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default = "super::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    Social,
    Auction,
    Order,
    Admin,
}

/// Payload for creating a notification, from the WebSocket
/// `createNotification` event or the HTTP trigger endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: i64,
    pub message: String,
    pub category: NotificationCategory,
    #[serde(default)]
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&NotificationCategory::Social).unwrap(),
            r#""SOCIAL""#
        );
        assert_eq!(
            serde_json::from_str::<NotificationCategory>(r#""ADMIN""#).unwrap(),
            NotificationCategory::Admin
        );
    }

    #[test]
    fn test_new_notification_link_optional() {
        let payload: NewNotification = serde_json::from_str(
            r#"{"userId": 4, "message": "Order shipped", "category": "ORDER"}"#,
        )
        .unwrap();
        assert_eq!(payload.user_id, 4);
        assert!(payload.link.is_none());
    }
}
