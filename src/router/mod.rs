//! Outbound side: pipeline records to socket emissions.

mod dispatcher;
mod types;

pub use dispatcher::{OutboundRouter, RouterStats, RouterStatsSnapshot};
pub use types::{DispatchResult, EmitMode, OutboundRecord};
