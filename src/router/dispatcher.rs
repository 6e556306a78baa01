use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::connection_manager::{ConnectionHandle, ConnectionRegistry};
use crate::metrics::RouterMetrics;

use super::types::{DispatchResult, EmitMode, OutboundRecord};

/// Maximum number of concurrent sends in one dispatch
const MAX_CONCURRENT_SENDS: usize = 100;

/// Statistics for the outbound router
#[derive(Debug, Default)]
pub struct RouterStats {
    pub total_dispatched: AtomicU64,
    pub total_delivered: AtomicU64,
    pub total_failed: AtomicU64,
    /// Dispatches that reached nobody because the target was unknown or malformed
    pub total_skipped: AtomicU64,
    pub direct: AtomicU64,
    pub broadcast: AtomicU64,
    pub room: AtomicU64,
    pub global: AtomicU64,
}

impl RouterStats {
    pub fn snapshot(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            total_dispatched: self.total_dispatched.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_skipped: self.total_skipped.load(Ordering::Relaxed),
            direct: self.direct.load(Ordering::Relaxed),
            broadcast: self.broadcast.load(Ordering::Relaxed),
            room: self.room.load(Ordering::Relaxed),
            global: self.global.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: &DispatchResult, skipped: bool) {
        self.total_dispatched.fetch_add(1, Ordering::Relaxed);
        self.total_delivered
            .fetch_add(result.delivered as u64, Ordering::Relaxed);
        self.total_failed
            .fetch_add(result.failed as u64, Ordering::Relaxed);
        if skipped {
            self.total_skipped.fetch_add(1, Ordering::Relaxed);
        }

        let per_mode = match result.mode {
            EmitMode::Direct => &self.direct,
            EmitMode::Broadcast => &self.broadcast,
            EmitMode::Room => &self.room,
            EmitMode::Global => &self.global,
        };
        per_mode.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of router statistics
#[derive(Debug, Clone, Serialize)]
pub struct RouterStatsSnapshot {
    pub total_dispatched: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub total_skipped: u64,
    pub direct: u64,
    pub broadcast: u64,
    pub room: u64,
    pub global: u64,
}

/// Resolves outbound records to live connections and queues the event on each.
///
/// Unknown connections, empty rooms and room records without a room name all
/// dispatch to nobody; none of them is an error.
pub struct OutboundRouter {
    registry: Arc<ConnectionRegistry>,
    stats: RouterStats,
}

enum Target {
    Connections(Vec<Arc<ConnectionHandle>>),
    Skip(&'static str),
}

impl OutboundRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            stats: RouterStats::default(),
        }
    }

    pub fn stats(&self) -> RouterStatsSnapshot {
        self.stats.snapshot()
    }

    /// Apply the record's property write, then emit it to its resolved recipients
    #[tracing::instrument(
        name = "router.dispatch",
        skip(self, record),
        fields(mode = %record.mode, event = %record.event)
    )]
    pub async fn dispatch(&self, record: OutboundRecord) -> DispatchResult {
        let OutboundRecord {
            mode,
            event,
            payload,
            connection_id,
            room,
            static_properties,
        } = record;

        if let (Some(props), Some(id)) = (static_properties, connection_id.as_deref()) {
            self.registry.set_properties(id, props);
        }

        let target = match mode {
            EmitMode::Broadcast => self.resolve_broadcast(connection_id.as_deref()),
            EmitMode::Direct => self.resolve_direct(connection_id.as_deref()),
            EmitMode::Room => self.resolve_room(room.as_deref()),
            EmitMode::Global => Target::Connections(self.registry.connections()),
        };

        let (result, skipped) = match target {
            Target::Skip(reason) => {
                tracing::debug!(reason = reason, "Dispatch skipped");
                (DispatchResult::skipped(mode), true)
            }
            Target::Connections(connections) => {
                let (delivered, failed) =
                    Self::send_to_connections(&connections, &event, &payload).await;
                (
                    DispatchResult {
                        mode,
                        delivered,
                        failed,
                    },
                    false,
                )
            }
        };

        self.stats.record(&result, skipped);
        RouterMetrics::record_dispatch(&result);

        tracing::debug!(
            delivered = result.delivered,
            failed = result.failed,
            "Dispatch completed"
        );

        result
    }

    fn resolve_broadcast(&self, connection_id: Option<&str>) -> Target {
        let Some(sender) = connection_id.and_then(|id| self.registry.lookup(id)) else {
            return Target::Skip("unknown sender");
        };

        Target::Connections(
            self.registry
                .connections()
                .into_iter()
                .filter(|conn| conn.id != sender.id)
                .collect(),
        )
    }

    fn resolve_direct(&self, connection_id: Option<&str>) -> Target {
        match connection_id.and_then(|id| self.registry.lookup(id)) {
            Some(conn) => Target::Connections(vec![conn]),
            None => Target::Skip("unknown connection"),
        }
    }

    fn resolve_room(&self, room: Option<&str>) -> Target {
        match room {
            Some(room) if !room.is_empty() => {
                Target::Connections(self.registry.room_connections(room))
            }
            _ => Target::Skip("missing room name"),
        }
    }

    /// Queue the event on each connection, returning (delivered, failed)
    async fn send_to_connections(
        connections: &[Arc<ConnectionHandle>],
        event: &str,
        payload: &Value,
    ) -> (usize, usize) {
        if connections.is_empty() {
            return (0, 0);
        }

        let mut delivered = 0;
        let mut failed = 0;

        if connections.len() <= 3 {
            for conn in connections {
                match conn.emit(event, payload.clone()).await {
                    Ok(()) => delivered += 1,
                    Err(_) => failed += 1,
                }
            }
            return (delivered, failed);
        }

        // Bounded parallelism so one slow queue does not hold up the rest
        let mut futures = FuturesUnordered::new();
        for conn in connections {
            let conn = conn.clone();
            let payload = payload.clone();
            futures.push(async move { conn.emit(event, payload).await.is_ok() });

            if futures.len() >= MAX_CONCURRENT_SENDS {
                if let Some(ok) = futures.next().await {
                    if ok {
                        delivered += 1;
                    } else {
                        failed += 1;
                    }
                }
            }
        }

        while let Some(ok) = futures.next().await {
            if ok {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        (delivered, failed)
    }
}
