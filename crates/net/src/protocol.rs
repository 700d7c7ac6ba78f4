//! Wire protocol: one JSON object per line, each carrying a `type` field.
//!
//! Only two types are reserved control messages; everything else is an
//! opaque application payload the relay forwards untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved control messages recognized by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMsg {
    /// First message on every connection: the server's session identifier.
    #[serde(rename = "id_assignment")]
    IdAssignment { id: u64 },
    /// A peer left; broadcast by the server to everyone remaining.
    #[serde(rename = "disconnect")]
    Disconnect { id: u64 },
}

impl ControlMsg {
    /// Wire form, newline-free.
    pub fn encode(&self) -> String {
        // A struct of two scalar fields cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a line as a control message; `None` for application payloads.
    pub fn decode(line: &str) -> Option<Self> {
        serde_json::from_str(line).ok()
    }
}

/// Parse a line as a generic message, requiring the `type` field.
/// Malformed lines are dropped with a warning rather than surfaced.
pub fn decode_payload(line: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(line) {
        Ok(value) if value.get("type").is_some() => Some(value),
        Ok(_) => {
            log::warn!("dropping message without a type field");
            None
        }
        Err(e) => {
            log::warn!("dropping malformed message: {e}");
            None
        }
    }
}

/// Serialize an outbound payload to its wire line.
pub fn encode_payload(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn control_roundtrip() {
        let msg = ControlMsg::IdAssignment { id: 7 };
        let line = msg.encode();
        assert!(!line.contains('\n'));
        assert_eq!(ControlMsg::decode(&line), Some(msg));

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["type"], "id_assignment");
        assert_eq!(parsed["id"], 7);
    }

    #[test]
    fn app_payloads_are_not_control() {
        assert_eq!(ControlMsg::decode(r#"{"type":"move","x":3}"#), None);
        assert!(decode_payload(r#"{"type":"move","x":3}"#).is_some());
    }

    #[test]
    fn malformed_lines_are_dropped() {
        assert!(decode_payload("not json").is_none());
        assert!(decode_payload(r#"{"x":1}"#).is_none());
        assert!(decode_payload(&encode_payload(&json!({"type": "x"}))).is_some());
    }
}
