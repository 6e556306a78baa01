//! Registry statistics and info structures

use serde::Serialize;
use std::collections::HashMap;

/// Registry statistics
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_connections: usize,
    /// room -> member count
    pub rooms: HashMap<String, usize>,
    /// Identifiers holding custom properties, live or not
    pub property_entries: usize,
}

/// Room information
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub name: String,
    pub member_count: usize,
}
