//! Connection handle and related types

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Notify};

use crate::websocket::EventFrame;

/// Handle for a single live socket connection
pub struct ConnectionHandle {
    pub id: String,
    pub sender: mpsc::Sender<EventFrame>,
    pub connected_at: DateTime<Utc>,
    /// Rooms this connection is a member of, mirrored in the registry's room index
    pub rooms: DashSet<String>,
    closing: AtomicBool,
    close_signal: Notify,
}

impl ConnectionHandle {
    pub fn new(id: impl Into<String>, sender: mpsc::Sender<EventFrame>) -> Self {
        Self {
            id: id.into(),
            sender,
            connected_at: Utc::now(),
            rooms: DashSet::new(),
            closing: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }

    /// Create a handle with a freshly generated identifier
    pub fn with_generated_id(sender: mpsc::Sender<EventFrame>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), sender)
    }

    /// Queue an event for this connection
    pub async fn emit(
        &self,
        event: &str,
        payload: Value,
    ) -> Result<(), mpsc::error::SendError<EventFrame>> {
        self.sender.send(EventFrame::new(event, payload)).await
    }

    /// Ask the transport session to terminate. Idempotent.
    pub fn close(&self) {
        if !self.closing.swap(true, Ordering::AcqRel) {
            // notify_one stores a permit when nobody is waiting yet
            self.close_signal.notify_one();
        }
    }

    /// Whether the server side requested termination
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Resolves once `close` has been called
    pub async fn closed(&self) {
        if self.is_closing() {
            return;
        }
        self.close_signal.notified().await;
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("rooms", &self.rooms.len())
            .field("closing", &self.is_closing())
            .finish()
    }
}
