//! Room membership requested by the pipeline.
//!
//! Joins and leaves read the connection from `socketIOId` and the room from
//! `payload.room`. A join on a live connection echoes the triggering message back so
//! the pipeline can carry on with it; nothing else produces output.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::connection_manager::ConnectionRegistry;
use crate::metrics::RoomMetrics;
use crate::pipeline::HostMessage;

pub struct RoomMembership {
    registry: Arc<ConnectionRegistry>,
}

impl RoomMembership {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Join the message's connection to `payload.room`.
    ///
    /// Returns the message unchanged whenever the connection is live, `None` otherwise.
    #[tracing::instrument(
        name = "rooms.join",
        skip(self, message),
        fields(connection_id = ?message.connection_id)
    )]
    pub fn join(&self, message: HostMessage) -> Option<HostMessage> {
        let connection_id = message.connection_id.as_deref()?;
        if !self.registry.contains(connection_id) {
            tracing::debug!("Join skipped, connection not live");
            return None;
        }

        // A live connection is echoed even when no room is named
        match message.payload_room() {
            Some(room) if self.registry.join_room(connection_id, room) => {
                RoomMetrics::record_join();
            }
            Some(_) => return None,
            None => tracing::debug!("Join without payload.room, nothing joined"),
        }

        Some(message)
    }

    /// Remove the message's connection from `payload.room`. Never echoes.
    #[tracing::instrument(
        name = "rooms.leave",
        skip(self, message),
        fields(connection_id = ?message.connection_id)
    )]
    pub fn leave(&self, message: &HostMessage) {
        let (Some(connection_id), Some(room)) =
            (message.connection_id.as_deref(), message.payload_room())
        else {
            return;
        };

        if self.registry.leave_room(connection_id, room) {
            RoomMetrics::record_leave();
        }
    }

    /// Snapshot of every room and its members, self-rooms included
    pub fn list_rooms(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.registry.rooms()
    }
}
