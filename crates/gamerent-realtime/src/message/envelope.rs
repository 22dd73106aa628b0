//! JSON envelope framing every real-time message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire form: `{ "type", "payload", "sender", "timestamp" }`.
///
/// Only `type` is required on input; the payload shape is checked when the
/// envelope is turned into a [`Message`](super::Message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Originating identity, or `"server"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Time the server stamped the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Render as a JSON object value.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("type".into(), Value::String(self.kind.clone()));
        if let Some(payload) = &self.payload {
            map.insert("payload".into(), payload.clone());
        }
        if let Some(sender) = &self.sender {
            map.insert("sender".into(), Value::String(sender.clone()));
        }
        if let Some(timestamp) = &self.timestamp {
            map.insert("timestamp".into(), Value::String(timestamp.to_rfc3339()));
        }
        Value::Object(map)
    }
}
