//! Generic wire message.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "new_message",
//!   "message": { "sender_name": "Alice", "content": "hi" }
//! }
//! ```
//!
//! The `type` tag is required; every other field is kept verbatim in
//! [`Message::payload`] so consumers can read fields the client does not
//! know about.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// ============================================================================
// Message
// ============================================================================

/// A discriminated wire record: a `type` tag plus an open payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type tag.
    #[serde(rename = "type")]
    pub message_type: String,

    /// All remaining top-level fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Message {
    /// Creates a message with an empty payload.
    #[inline]
    #[must_use]
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            payload: Map::new(),
        }
    }

    /// Adds a top-level payload field.
    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not a JSON
    /// object with a string `type` field.
    pub fn from_text(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns the type tag.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.message_type
    }

    /// Looks up a nested payload value by key path.
    ///
    /// `["message", "sender_name"]` reads `payload.message.sender_name`.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.payload.get(*first)?, |value, key| value.get(*key))
    }

    /// Gets a nested string, empty when absent.
    #[inline]
    pub(crate) fn get_string(&self, path: &[&str]) -> String {
        self.get_optional_string(path).unwrap_or_default()
    }

    /// Gets a nested string if present.
    #[inline]
    pub(crate) fn get_optional_string(&self, path: &[&str]) -> Option<String> {
        self.get(path)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Gets a nested bool, `false` when absent.
    #[inline]
    pub(crate) fn get_bool(&self, path: &[&str]) -> bool {
        self.get(path)
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }

    /// Gets a nested unsigned integer if present.
    #[inline]
    pub(crate) fn get_u64(&self, path: &[&str]) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_keeps_unknown_fields() {
        let message =
            Message::from_text(r#"{"type":"custom_event","answer":42,"nested":{"a":"b"}}"#)
                .expect("parse");

        assert_eq!(message.kind(), "custom_event");
        assert_eq!(message.payload.get("answer"), Some(&json!(42)));
        assert_eq!(message.get(&["nested", "a"]), Some(&json!("b")));
    }

    #[test]
    fn test_parse_requires_type() {
        assert!(Message::from_text(r#"{"message":"no tag"}"#).is_err());
        assert!(Message::from_text(r#"{"type":7}"#).is_err());
        assert!(Message::from_text("not json").is_err());
    }

    #[test]
    fn test_serialize_flattens_payload() {
        let message = Message::new("reaction_added").with_field("emoji", "👍");
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value, json!({ "type": "reaction_added", "emoji": "👍" }));
    }

    #[test]
    fn test_nested_getters() {
        let message = Message::new("connection_response")
            .with_field("accepted", true)
            .with_field("data", json!({ "responder_name": "Bob", "id": 9 }));

        assert!(message.get_bool(&["accepted"]));
        assert_eq!(message.get_string(&["data", "responder_name"]), "Bob");
        assert_eq!(message.get_u64(&["data", "id"]), Some(9));
        assert_eq!(message.get_string(&["data", "missing"]), "");
        assert!(message.get(&[]).is_none());
    }
}
