use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use super::stats::RegistryStats;
use super::types::ConnectionHandle;

/// Custom properties attached to a connection identifier
pub type Properties = Map<String, Value>;

/// Owns every live connection, the room index and per-connection custom properties.
///
/// Lookups for unknown identifiers return `None` or `false`; callers treat that as
/// "skip silently". Custom properties are keyed by identifier only and outlive the
/// connection they were written for.
pub struct ConnectionRegistry {
    /// connection_id -> ConnectionHandle
    connections: DashMap<String, Arc<ConnectionHandle>>,
    /// room -> Set<connection_id>
    room_index: DashMap<String, HashSet<String>>,
    /// connection_id -> custom properties
    properties: DashMap<String, Properties>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            room_index: DashMap::new(),
            properties: DashMap::new(),
        }
    }

    /// Add a connection to the live set and join it to its own room.
    ///
    /// Returns `false` without touching anything if the identifier is already live.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> bool {
        let conn_id = handle.id.clone();

        match self.connections.entry(conn_id.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(connection_id = %conn_id, "Connection already registered");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(handle);
            }
        }

        self.join_room(&conn_id, &conn_id);

        tracing::info!(connection_id = %conn_id, "Connection registered");
        true
    }

    /// Remove a connection, drop its room memberships and signal its transport to close.
    ///
    /// Custom properties for the identifier are kept.
    pub fn unregister(&self, connection_id: &str) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.connections.remove(connection_id)?;

        for room in handle.rooms.iter() {
            self.remove_from_index(room.key(), connection_id);
        }
        handle.rooms.clear();
        handle.close();

        tracing::info!(connection_id = %connection_id, "Connection unregistered");
        Some(handle)
    }

    /// Get connection by ID
    pub fn lookup(&self, connection_id: &str) -> Option<Arc<ConnectionHandle>> {
        self.connections.get(connection_id).map(|h| h.clone())
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }

    pub fn connection_ids(&self) -> Vec<String> {
        self.connections.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Merge `new_props` into the identifier's properties, creating the entry if needed.
    /// Keys already present are overwritten.
    pub fn set_properties(&self, connection_id: &str, new_props: Properties) {
        match self.properties.entry(connection_id.to_string()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().extend(new_props);
            }
            Entry::Vacant(slot) => {
                slot.insert(new_props);
            }
        }

        tracing::debug!(connection_id = %connection_id, "Custom properties updated");
    }

    /// Snapshot of the identifier's custom properties
    pub fn get_properties(&self, connection_id: &str) -> Option<Properties> {
        self.properties.get(connection_id).map(|p| p.clone())
    }

    /// Add a live connection to a room. Returns `false` if the connection is unknown.
    pub fn join_room(&self, connection_id: &str, room: &str) -> bool {
        // Hold the connection entry so a concurrent unregister sees the new membership
        let Some(handle) = self.connections.get(connection_id) else {
            return false;
        };

        handle.rooms.insert(room.to_string());
        self.room_index
            .entry(room.to_string())
            .or_default()
            .insert(connection_id.to_string());

        tracing::debug!(connection_id = %connection_id, room = %room, "Joined room");
        true
    }

    /// Remove a live connection from a room. Returns `false` if the connection is unknown.
    ///
    /// Leaving a room the connection never joined changes nothing.
    pub fn leave_room(&self, connection_id: &str, room: &str) -> bool {
        let Some(handle) = self.connections.get(connection_id) else {
            return false;
        };

        if handle.rooms.remove(room).is_some() {
            self.remove_from_index(room, connection_id);
            tracing::debug!(connection_id = %connection_id, room = %room, "Left room");
        }
        true
    }

    /// Get all live connections joined to a room
    pub fn room_connections(&self, room: &str) -> Vec<Arc<ConnectionHandle>> {
        // Release the index guard before touching `connections`; join_room locks them the other way round
        let conn_ids: Vec<String> = match self.room_index.get(room) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return Vec::new(),
        };

        conn_ids
            .iter()
            .filter_map(|id| self.lookup(id))
            .collect()
    }

    /// Snapshot of every room and its members
    pub fn rooms(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.room_index
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().iter().cloned().collect(),
                )
            })
            .collect()
    }

    /// Get statistics
    pub fn stats(&self) -> RegistryStats {
        let rooms: HashMap<String, usize> = self
            .room_index
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect();

        RegistryStats {
            total_connections: self.connections.len(),
            rooms,
            property_entries: self.properties.len(),
        }
    }

    /// Unregister every live connection, returning the removed handles
    pub fn disconnect_all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connection_ids()
            .into_iter()
            .filter_map(|conn_id| {
                let handle = self.unregister(&conn_id)?;
                tracing::info!(connection_id = %conn_id, "Disconnected on shutdown");
                Some(handle)
            })
            .collect()
    }

    fn remove_from_index(&self, room: &str, connection_id: &str) {
        if let Some(mut members) = self.room_index.get_mut(room) {
            members.remove(connection_id);
            if members.is_empty() {
                drop(members);
                self.room_index.remove_if(room, |_, m| m.is_empty());
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::websocket::EventFrame;

    fn handle(id: &str) -> (Arc<ConnectionHandle>, mpsc::Receiver<EventFrame>) {
        let (tx, rx) = mpsc::channel(8);
        (Arc::new(ConnectionHandle::new(id, tx)), rx)
    }

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = handle("a");

        assert!(registry.register(a));
        assert!(registry.lookup("a").is_some());
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_twice_is_noop() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = handle("a");
        let (second, _rx2) = handle("a");

        assert!(registry.register(first.clone()));
        assert!(!registry.register(second));
        assert!(Arc::ptr_eq(&registry.lookup("a").unwrap(), &first));
    }

    #[test]
    fn test_register_joins_self_room() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = handle("a");
        registry.register(a);

        let rooms = registry.rooms();
        assert_eq!(rooms.get("a").unwrap().len(), 1);
        assert!(rooms["a"].contains("a"));
    }

    #[test]
    fn test_unregister_closes_and_clears_rooms() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = handle("a");
        registry.register(a.clone());
        registry.join_room("a", "r1");

        let removed = registry.unregister("a").unwrap();
        assert!(removed.is_closing());
        assert!(registry.lookup("a").is_none());
        assert!(registry.rooms().is_empty());
        assert!(registry.unregister("a").is_none());
    }

    #[test]
    fn test_unregister_keeps_properties() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = handle("a");
        registry.register(a);
        registry.set_properties("a", props(json!({"x": 1})));

        registry.unregister("a");

        assert_eq!(registry.get_properties("a"), Some(props(json!({"x": 1}))));
    }

    #[test]
    fn test_set_properties_merges() {
        let registry = ConnectionRegistry::new();

        registry.set_properties("a", props(json!({"x": 1})));
        registry.set_properties("a", props(json!({"y": 2})));
        assert_eq!(
            registry.get_properties("a"),
            Some(props(json!({"x": 1, "y": 2})))
        );

        registry.set_properties("a", props(json!({"x": "new"})));
        assert_eq!(
            registry.get_properties("a"),
            Some(props(json!({"x": "new", "y": 2})))
        );
    }

    #[test]
    fn test_properties_need_no_live_connection() {
        let registry = ConnectionRegistry::new();
        assert!(registry.get_properties("ghost").is_none());

        registry.set_properties("ghost", props(json!({"k": true})));
        assert_eq!(registry.get_properties("ghost"), Some(props(json!({"k": true}))));
        assert!(registry.lookup("ghost").is_none());
    }

    #[test]
    fn test_join_and_leave_room() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = handle("a");
        registry.register(a.clone());

        assert!(registry.join_room("a", "r1"));
        assert!(a.rooms.contains("r1"));
        assert_eq!(registry.room_connections("r1").len(), 1);

        assert!(registry.leave_room("a", "r1"));
        assert!(!a.rooms.contains("r1"));
        assert!(registry.room_connections("r1").is_empty());
        assert!(!registry.rooms().contains_key("r1"));
    }

    #[test]
    fn test_room_ops_for_unknown_connection() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.join_room("ghost", "r1"));
        assert!(!registry.leave_room("ghost", "r1"));
        assert!(registry.rooms().is_empty());
    }

    #[test]
    fn test_leave_unjoined_room_is_noop() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = handle("a");
        registry.register(a);
        let before = registry.rooms();

        assert!(registry.leave_room("a", "never-joined"));
        assert_eq!(registry.rooms(), before);
    }

    #[test]
    fn test_stats() {
        let registry = ConnectionRegistry::new();
        let (a, _rx1) = handle("a");
        let (b, _rx2) = handle("b");
        registry.register(a);
        registry.register(b);
        registry.join_room("a", "r1");
        registry.join_room("b", "r1");
        registry.set_properties("a", props(json!({"x": 1})));

        let stats = registry.stats();
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.rooms.get("r1"), Some(&2));
        assert_eq!(stats.property_entries, 1);
    }

    #[test]
    fn test_disconnect_all() {
        let registry = ConnectionRegistry::new();
        let (a, _rx1) = handle("a");
        let (b, _rx2) = handle("b");
        registry.register(a.clone());
        registry.register(b.clone());

        assert_eq!(registry.disconnect_all().len(), 2);
        assert!(registry.is_empty());
        assert!(a.is_closing());
        assert!(b.is_closing());
    }
}
