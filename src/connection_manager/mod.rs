//! Live connection tracking
//!
//! This module provides:
//! - Connection handles with a close signal for the transport
//! - Room indexing
//! - Custom properties per connection identifier
//! - Registry statistics

mod registry;
mod stats;
mod types;

pub use registry::{ConnectionRegistry, Properties};
pub use stats::{RegistryStats, RoomInfo};
pub use types::ConnectionHandle;
