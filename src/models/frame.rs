//! WebSocket frame envelope.
//!
//! Every namespace speaks JSON text frames shaped as
//! `{ "event": "<name>", "data": { ... } }`, mirroring the socket.io
//! emit convention the browser clients use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single inbound or outbound WebSocket event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    /// Build a frame from an event name and any serializable payload.
    /// Unserializable data degrades to null rather than panicking.
    pub fn new(event: &str, data: &impl Serialize) -> Self {
        Self {
            event: event.to_string(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }

    /// Parse an inbound text frame. Returns None for malformed JSON
    /// or frames without an event name (log-and-degrade at call sites).
    pub fn parse(text: &str) -> Option<Self> {
        let frame: Frame = serde_json::from_str(text).ok()?;
        if frame.event.is_empty() {
            return None;
        }
        Some(frame)
    }

    /// Deserialize the data payload into a concrete type.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.data.clone()).ok()
    }

    /// Serialize to the wire representation.
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_frame() {
        let frame = Frame::parse(r#"{"event":"placeBid","data":{"auctionId":7,"amount":25.0}}"#)
            .expect("valid frame");
        assert_eq!(frame.event, "placeBid");
        assert_eq!(frame.data["auctionId"], json!(7));
    }

    #[test]
    fn test_parse_missing_data_defaults_null() {
        let frame = Frame::parse(r#"{"event":"markAllAsRead"}"#).expect("valid frame");
        assert_eq!(frame.event, "markAllAsRead");
        assert!(frame.data.is_null());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Frame::parse("not json").is_none());
        assert!(Frame::parse(r#"{"data":{}}"#).is_none());
        assert!(Frame::parse(r#"{"event":""}"#).is_none());
    }

    #[test]
    fn test_round_trip() {
        let frame = Frame::new("bidding_update", &json!({"success": true}));
        let parsed = Frame::parse(&frame.to_text()).unwrap();
        assert_eq!(parsed.event, "bidding_update");
        assert_eq!(parsed.data["success"], json!(true));
    }
}
