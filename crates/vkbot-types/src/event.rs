//! Long-poll event envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Message;

/// Event type names that carry a message object.
pub mod event_types {
    pub const MESSAGE_NEW: &str = "message_new";
    pub const MESSAGE_REPLY: &str = "message_reply";
    pub const MESSAGE_EDIT: &str = "message_edit";
    pub const MESSAGE_EVENT: &str = "message_event";
    pub const GROUP_JOIN: &str = "group_join";
    pub const GROUP_LEAVE: &str = "group_leave";
}

/// One event reported by the long-poll server.
///
/// The record is kept as the raw JSON value so that event types this crate
/// does not know about pass through untouched. Accessors read the common
/// envelope fields (`type`, `object`, `group_id`, `event_id`) on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The event type, e.g. `message_new`.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn object(&self) -> Option<&Value> {
        self.0.get("object")
    }

    pub fn group_id(&self) -> Option<i64> {
        self.0.get("group_id").and_then(Value::as_i64)
    }

    pub fn event_id(&self) -> Option<&str> {
        self.0.get("event_id").and_then(Value::as_str)
    }

    /// Decode the message carried by a message event.
    ///
    /// Returns `None` for event types that do not carry a message. Newer API
    /// versions nest the message under `object.message` for `message_new`;
    /// `message_reply` and `message_edit` put it directly in `object`.
    pub fn message(&self) -> Option<Result<Message, serde_json::Error>> {
        match self.kind()? {
            event_types::MESSAGE_NEW | event_types::MESSAGE_REPLY | event_types::MESSAGE_EDIT => {}
            _ => return None,
        }
        let object = self.object()?;
        let message = object.get("message").unwrap_or(object);
        Some(Message::deserialize(message))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Event {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}
