//! Message object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message as returned in events and by `messages.*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID. Zero for messages in group chats the bot can't address by ID.
    pub id: i64,
    pub peer_id: i64,
    pub from_id: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_message_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fwd_messages: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Value>,
    /// Button payload, a JSON document encoded as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Message {
    /// Decode the button payload, if any.
    pub fn payload_json(&self) -> Option<Result<Value, serde_json::Error>> {
        self.payload.as_deref().map(serde_json::from_str)
    }

    /// Messages in multi-user chats have peer IDs above this offset.
    pub const CHAT_PEER_OFFSET: i64 = 2_000_000_000;

    pub fn is_from_chat(&self) -> bool {
        self.peer_id > Self::CHAT_PEER_OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_minimal_message() {
        let message: Message = serde_json::from_value(json!({
            "id": 1,
            "peer_id": 2000000001,
            "from_id": 5,
            "date": 1700000000
        }))
        .unwrap();

        assert_eq!(message.text, "");
        assert_eq!(message.date.timestamp(), 1_700_000_000);
        assert!(message.attachments.is_none());
        assert!(message.is_from_chat());
    }

    #[test]
    fn serialize_skips_absent_fields() {
        let message: Message = serde_json::from_value(json!({
            "id": 1,
            "peer_id": 5,
            "from_id": 5,
            "date": 1700000000,
            "text": "hello"
        }))
        .unwrap();

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["date"], 1_700_000_000);
        assert!(value.get("keyboard").is_none());
        assert!(value.get("fwd_messages").is_none());
    }

    #[test]
    fn payload_json_decodes_button_payload() {
        let message: Message = serde_json::from_value(json!({
            "id": 1,
            "peer_id": 5,
            "from_id": 5,
            "date": 1700000000,
            "payload": "{\"button\":\"start\"}"
        }))
        .unwrap();

        let payload = message.payload_json().unwrap().unwrap();
        assert_eq!(payload["button"], "start");
    }
}
