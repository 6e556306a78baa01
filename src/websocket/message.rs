use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named event with its payload, as carried in a single text frame.
///
/// Used for both directions: `{"event": "chat", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_frame_without_data() {
        let frame: EventFrame = serde_json::from_str(r#"{"event":"typing"}"#).unwrap();
        assert_eq!(frame.event, "typing");
        assert_eq!(frame.data, Value::Null);
    }

    #[test]
    fn test_frame_json_shape() {
        let json = EventFrame::new("ping", json!(42)).to_json().unwrap();
        assert_eq!(json, r#"{"event":"ping","data":42}"#);
    }

    #[test]
    fn test_missing_event_is_rejected() {
        assert!(serde_json::from_str::<EventFrame>(r#"{"data":1}"#).is_err());
    }
}
