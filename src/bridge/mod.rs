//! Inbound side: protocol events to pipeline records.

mod event_bridge;
mod types;

pub use event_bridge::EventBridge;
pub use types::{InboundRecord, Subscriptions, LIFECYCLE_EVENTS};
