//! Chat service: in-memory messages, presence, best-effort persistence.
//!
//! Messages live in an unbounded in-process list and are mirrored to an
//! external database-backed API; a persistence failure is logged and
//! never blocks or rolls back the in-memory append. History reads prefer
//! the external store and fall back to memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ChatConfig, UpstreamConfig};
use crate::models::{ChatMessage, Frame, OnlineUser};
use crate::services::RoomRegistry;

/// Chat message relay and online-user bookkeeping.
pub struct ChatService {
    client: Client,
    base_url: String,
    messages: RwLock<Vec<ChatMessage>>,
    online: RwLock<HashMap<String, OnlineUser>>,
}

impl ChatService {
    /// Create a new chat service.
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("AgoraGateway/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            messages: RwLock::new(Vec::new()),
            online: RwLock::new(HashMap::new()),
        }
    }

    /// Append a message to memory, mirror it to the persistence API
    /// best-effort, and bump the sender's activity timestamp.
    pub async fn save_message(&self, message: ChatMessage) {
        self.messages.write().await.push(message.clone());
        self.touch_activity(&message.sender).await;

        let url = format!("{}/api/messages", self.base_url);
        match self.client.post(&url).json(&message).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(sender = %message.sender, "chat message persisted");
            }
            Ok(response) => {
                warn!(
                    sender = %message.sender,
                    status = %response.status(),
                    "chat persistence rejected message, keeping in memory"
                );
            }
            Err(e) => {
                warn!(
                    sender = %message.sender,
                    error = %e,
                    "chat persistence unreachable, keeping in memory"
                );
            }
        }
    }

    /// Chat history for `user`, optionally narrowed to the conversation
    /// with `with_user`.
    ///
    /// Resolution order: pattern-match endpoint, exact-match endpoint,
    /// in-memory filter. The first non-empty result wins.
    pub async fn history(&self, user: &str, with_user: Option<&str>) -> Vec<ChatMessage> {
        let participant = with_user.unwrap_or(user);

        let pattern_url = format!("{}/api/messages/search", self.base_url);
        if let Some(messages) = self
            .fetch_messages(&pattern_url, &[("user", participant)])
            .await
        {
            if !messages.is_empty() {
                return messages;
            }
        }

        let exact_url = format!("{}/api/messages", self.base_url);
        if let Some(messages) = self
            .fetch_messages(&exact_url, &[("sender", user), ("recipient", participant)])
            .await
        {
            if !messages.is_empty() {
                return messages;
            }
        }

        let messages = self.messages.read().await;
        messages
            .iter()
            .filter(|m| m.involves(user))
            .filter(|m| with_user.map_or(true, |w| m.involves(w)))
            .cloned()
            .collect()
    }

    async fn fetch_messages(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Option<Vec<ChatMessage>> {
        match self.client.get(url).query(query).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<ChatMessage>>().await {
                    Ok(messages) => Some(messages),
                    Err(e) => {
                        warn!(url, error = %e, "malformed chat history response");
                        None
                    }
                }
            }
            Ok(response) => {
                debug!(url, status = %response.status(), "chat history endpoint refused");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "chat history endpoint unreachable");
                None
            }
        }
    }

    /// Register a user as online, replacing any previous socket.
    pub async fn add_online(&self, username: &str, socket_id: &str) -> OnlineUser {
        let now = Utc::now();
        let user = OnlineUser {
            username: username.to_string(),
            socket_id: socket_id.to_string(),
            joined_at: now,
            last_activity: now,
        };
        self.online
            .write()
            .await
            .insert(username.to_string(), user.clone());
        user
    }

    /// Remove the online user bound to a socket, if any.
    pub async fn remove_by_socket(&self, socket_id: &str) -> Option<OnlineUser> {
        let mut online = self.online.write().await;
        let username = online
            .values()
            .find(|u| u.socket_id == socket_id)?
            .username
            .clone();
        online.remove(&username)
    }

    pub async fn find_by_username(&self, username: &str) -> Option<OnlineUser> {
        self.online.read().await.get(username).cloned()
    }

    pub async fn find_by_socket(&self, socket_id: &str) -> Option<OnlineUser> {
        self.online
            .read()
            .await
            .values()
            .find(|u| u.socket_id == socket_id)
            .cloned()
    }

    pub async fn online_users(&self) -> Vec<OnlineUser> {
        self.online.read().await.values().cloned().collect()
    }

    /// Bump a user's last-activity timestamp.
    pub async fn touch_activity(&self, username: &str) {
        if let Some(user) = self.online.write().await.get_mut(username) {
            user.last_activity = Utc::now();
        }
    }

    /// Drop users idle longer than `max_idle` and return them.
    pub async fn cleanup_inactive(&self, max_idle: chrono::Duration) -> Vec<OnlineUser> {
        let cutoff = Utc::now() - max_idle;
        let mut online = self.online.write().await;
        let stale: Vec<String> = online
            .values()
            .filter(|u| u.last_activity < cutoff)
            .map(|u| u.username.clone())
            .collect();
        stale
            .into_iter()
            .filter_map(|username| online.remove(&username))
            .collect()
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn online_count(&self) -> usize {
        self.online.read().await.len()
    }

    /// Clear all messages involving a user from the in-memory list.
    pub async fn clear_messages_for(&self, username: &str) -> usize {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| !m.involves(username));
        before - messages.len()
    }
}

/// Start the online-user inactivity sweep.
///
/// Removes users idle past the configured threshold on a fixed interval
/// and announces each departure with a `userLeft` broadcast on the chat
/// namespace.
pub fn start_inactivity_sweep(
    chat: Arc<ChatService>,
    rooms: Arc<RoomRegistry>,
    config: &ChatConfig,
) -> JoinHandle<()> {
    let period = Duration::from_secs(config.sweep_interval_seconds.max(1));
    let max_idle = chrono::Duration::seconds(config.max_idle_seconds as i64);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = chat.cleanup_inactive(max_idle).await;
            for user in removed {
                info!(username = %user.username, "removed inactive chat user");
                rooms
                    .broadcast(Frame::new("userLeft", &json!({ "user": user })))
                    .await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessageType;

    fn test_config() -> UpstreamConfig {
        UpstreamConfig {
            // Unroutable; persistence and history calls fail fast into
            // the in-memory path.
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 1,
        }
    }

    fn message(sender: &str, recipient: Option<&str>, content: &str) -> ChatMessage {
        ChatMessage {
            sender: sender.to_string(),
            recipient: recipient.map(String::from),
            content: content.to_string(),
            message_type: ChatMessageType::Chat,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_survives_persistence_failure() {
        let service = ChatService::new(&test_config());
        service.save_message(message("alice", Some("bob"), "hi")).await;
        assert_eq!(service.message_count().await, 1);
    }

    #[tokio::test]
    async fn test_history_falls_back_to_memory() {
        let service = ChatService::new(&test_config());
        service.save_message(message("alice", Some("bob"), "hi")).await;
        service.save_message(message("bob", Some("alice"), "hey")).await;
        service.save_message(message("carol", Some("dave"), "unrelated")).await;

        let history = service.history("alice", Some("bob")).await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.involves("alice") && m.involves("bob")));
    }

    #[tokio::test]
    async fn test_history_without_peer_returns_all_involving_user() {
        let service = ChatService::new(&test_config());
        service.save_message(message("alice", Some("bob"), "hi")).await;
        service.save_message(message("carol", Some("alice"), "hello")).await;
        service.save_message(message("carol", Some("dave"), "unrelated")).await;

        let history = service.history("alice", None).await;
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_online_bookkeeping() {
        let service = ChatService::new(&test_config());
        service.add_online("alice", "s1").await;
        service.add_online("bob", "s2").await;

        assert_eq!(service.online_count().await, 2);
        assert_eq!(
            service.find_by_socket("s2").await.unwrap().username,
            "bob"
        );

        let removed = service.remove_by_socket("s1").await.unwrap();
        assert_eq!(removed.username, "alice");
        assert!(service.find_by_username("alice").await.is_none());
        assert_eq!(service.online_count().await, 1);
    }

    #[tokio::test]
    async fn test_save_updates_sender_activity() {
        let service = ChatService::new(&test_config());
        let before = service.add_online("alice", "s1").await.last_activity;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service.save_message(message("alice", None, "hi")).await;
        let after = service.find_by_username("alice").await.unwrap().last_activity;
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_idle_users() {
        let service = ChatService::new(&test_config());
        service.add_online("fresh", "s1").await;
        service.add_online("stale", "s2").await;
        {
            let mut online = service.online.write().await;
            online.get_mut("stale").unwrap().last_activity =
                Utc::now() - chrono::Duration::minutes(10);
        }

        let removed = service.cleanup_inactive(chrono::Duration::minutes(5)).await;
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].username, "stale");
        assert!(service.find_by_username("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_clear_messages_for_user() {
        let service = ChatService::new(&test_config());
        service.save_message(message("alice", Some("bob"), "hi")).await;
        service.save_message(message("carol", Some("dave"), "other")).await;

        assert_eq!(service.clear_messages_for("alice").await, 1);
        assert_eq!(service.message_count().await, 1);
    }
}
