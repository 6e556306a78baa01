//! Host pipeline message shape and its mapping onto bridge/router records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bridge::InboundRecord;
use crate::connection_manager::Properties;
use crate::router::{EmitMode, OutboundRecord};

/// A message as seen by the host pipeline.
///
/// Property names follow the pipeline's conventions (`socketIOEvent`, `socketIOId`, ...).
/// Any other properties are kept in `extra` so that echoed messages leave unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "socketIOEvent", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(rename = "socketIOId", default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// `"broadcast.emit"`, `"emit"`, `"room"`; anything else emits globally
    #[serde(rename = "socketIOEmit", default, skip_serializing_if = "Option::is_none")]
    pub emit: Option<String>,
    #[serde(
        rename = "socketIOAddStaticProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub add_static_properties: Option<Properties>,
    #[serde(
        rename = "socketIOStaticProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub static_properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HostMessage {
    /// Room name carried in `payload.room`, used by join and leave
    pub fn payload_room(&self) -> Option<&str> {
        self.payload.get("room").and_then(Value::as_str)
    }

    /// Build the outbound record this message asks for.
    ///
    /// Returns `None` when the message names no event.
    pub fn to_outbound(&self) -> Option<OutboundRecord> {
        let event = self.event.clone()?;

        Some(OutboundRecord {
            mode: EmitMode::from_host(self.emit.as_deref()),
            event,
            payload: self.payload.clone(),
            connection_id: self.connection_id.clone(),
            room: self.room.clone(),
            static_properties: self.add_static_properties.clone(),
        })
    }
}

impl From<InboundRecord> for HostMessage {
    fn from(record: InboundRecord) -> Self {
        Self {
            payload: record.payload,
            event: Some(record.event),
            connection_id: Some(record.connection_id),
            static_properties: record.static_properties,
            ..Default::default()
        }
    }
}
