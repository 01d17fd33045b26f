//! Chat messages and online-user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message relayed through the gateway.
///
/// Appended to an unbounded in-memory list and mirrored best-effort to
/// the external persistence API; a missing recipient means broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: ChatMessageType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatMessageType {
    Chat,
    Join,
    Leave,
}

impl ChatMessage {
    /// True if `user` sent or received this message.
    pub fn involves(&self, user: &str) -> bool {
        self.sender == user || self.recipient.as_deref() == Some(user)
    }
}

/// Presence record for a connected chat user, keyed by username.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub username: String,
    pub socket_id: String,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}
