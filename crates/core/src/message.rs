//! Control messages posted to the manager by the app shell.

use serde_json::Value;

/// Message type that asks a waiting generation to take over immediately.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// A recognized control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    SkipWaiting,
}

impl ControlMessage {
    /// Parse a message payload. Anything but `{ "type": "SKIP_WAITING" }` is `None`.
    pub fn parse(payload: &Value) -> Option<Self> {
        match payload.get("type").and_then(Value::as_str) {
            Some(SKIP_WAITING) => Some(ControlMessage::SkipWaiting),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_skip_waiting() {
        assert_eq!(ControlMessage::parse(&json!({ "type": "SKIP_WAITING" })), Some(ControlMessage::SkipWaiting));
        assert_eq!(
            ControlMessage::parse(&json!({ "type": "SKIP_WAITING", "from": "update-banner" })),
            Some(ControlMessage::SkipWaiting)
        );
    }

    #[test]
    fn test_parse_ignores_other_shapes() {
        assert_eq!(ControlMessage::parse(&json!({ "type": "skip_waiting" })), None);
        assert_eq!(ControlMessage::parse(&json!({ "kind": "SKIP_WAITING" })), None);
        assert_eq!(ControlMessage::parse(&json!("SKIP_WAITING")), None);
        assert_eq!(ControlMessage::parse(&json!(null)), None);
        assert_eq!(ControlMessage::parse(&json!({ "type": 1 })), None);
    }
}
