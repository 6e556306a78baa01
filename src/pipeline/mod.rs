//! Host pipeline adapter.
//!
//! The pipeline is the application side of the bridge: it receives inbound records as
//! [`HostMessage`]s through an [`InboundSink`] and submits host messages that become
//! outbound records, room joins and room leaves.

mod message;
mod sink;

pub use message::HostMessage;
pub use sink::{BroadcastSink, InboundSink};
