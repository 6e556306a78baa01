use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection_manager::Properties;

/// How an outbound record picks its recipients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// The named connection only
    Direct,
    /// Every live connection except the named one
    Broadcast,
    /// Every member of a room
    Room,
    /// Every live connection
    Global,
}

impl EmitMode {
    /// Map the pipeline's `socketIOEmit` value. Unknown or missing values emit globally.
    pub fn from_host(value: Option<&str>) -> Self {
        match value {
            Some("broadcast.emit") => Self::Broadcast,
            Some("emit") => Self::Direct,
            Some("room") => Self::Room,
            _ => Self::Global,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Broadcast => "broadcast",
            Self::Room => "room",
            Self::Global => "global",
        }
    }
}

impl std::fmt::Display for EmitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emission requested by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRecord {
    pub mode: EmitMode,
    pub event: String,
    pub payload: Value,
    /// Sender for `Broadcast`, recipient for `Direct`, ignored otherwise
    pub connection_id: Option<String>,
    /// Only read in `Room` mode
    pub room: Option<String>,
    /// Merged into the connection's custom properties before dispatch
    pub static_properties: Option<Properties>,
}

impl OutboundRecord {
    fn new(mode: EmitMode, event: impl Into<String>, payload: Value) -> Self {
        Self {
            mode,
            event: event.into(),
            payload,
            connection_id: None,
            room: None,
            static_properties: None,
        }
    }

    pub fn global(event: impl Into<String>, payload: Value) -> Self {
        Self::new(EmitMode::Global, event, payload)
    }

    pub fn direct(connection_id: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self::new(EmitMode::Direct, event, payload).sent_by(connection_id)
    }

    pub fn broadcast(
        connection_id: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::new(EmitMode::Broadcast, event, payload).sent_by(connection_id)
    }

    pub fn room(room: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        let mut record = Self::new(EmitMode::Room, event, payload);
        record.room = Some(room.into());
        record
    }

    pub fn sent_by(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.static_properties = Some(properties);
        self
    }
}

/// Outcome of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub mode: EmitMode,
    /// Connections the event was queued for
    pub delivered: usize,
    /// Connections whose send queue was already closed
    pub failed: usize,
}

impl DispatchResult {
    pub fn skipped(mode: EmitMode) -> Self {
        Self {
            mode,
            delivered: 0,
            failed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        let direct = OutboundRecord::direct("a", "e", json!(1));
        assert_eq!(direct.mode, EmitMode::Direct);
        assert_eq!(direct.connection_id.as_deref(), Some("a"));

        let room = OutboundRecord::room("r1", "e", json!(1));
        assert_eq!(room.mode, EmitMode::Room);
        assert_eq!(room.room.as_deref(), Some("r1"));
        assert!(room.connection_id.is_none());
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_value(EmitMode::Broadcast).unwrap(), json!("broadcast"));
        assert_eq!(EmitMode::Global.to_string(), "global");
    }
}
