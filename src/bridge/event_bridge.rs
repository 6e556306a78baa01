use std::sync::Arc;

use serde_json::Value;

use crate::connection_manager::ConnectionRegistry;
use crate::metrics::BridgeMetrics;
use crate::pipeline::InboundSink;

use super::types::{InboundRecord, Subscriptions, LIFECYCLE_EVENTS};

/// Turns protocol events on each connection into inbound records for the pipeline
pub struct EventBridge {
    rules: Vec<String>,
    registry: Arc<ConnectionRegistry>,
    sink: Arc<dyn InboundSink>,
}

impl EventBridge {
    pub fn new(
        rules: Vec<String>,
        registry: Arc<ConnectionRegistry>,
        sink: Arc<dyn InboundSink>,
    ) -> Self {
        Self {
            rules,
            registry,
            sink,
        }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Build the subscription table for a new connection: configured rules first, then
    /// the lifecycle events. Names appearing in both are kept twice.
    pub fn attach(&self, connection_id: &str) -> Subscriptions {
        let events = self
            .rules
            .iter()
            .cloned()
            .chain(LIFECYCLE_EVENTS.iter().map(|e| e.to_string()))
            .collect();

        tracing::debug!(
            connection_id = %connection_id,
            rules = self.rules.len(),
            "Attached event subscriptions"
        );

        Subscriptions::new(connection_id.to_string(), events)
    }

    /// Deliver one record per subscription entry matching `event`, in order.
    /// Returns how many records were delivered.
    #[tracing::instrument(
        name = "bridge.fire",
        skip(self, subscriptions, payload),
        fields(connection_id = %subscriptions.connection_id())
    )]
    pub async fn fire(&self, subscriptions: &Subscriptions, event: &str, payload: Value) -> usize {
        let matches = subscriptions.matching(event);
        if matches == 0 {
            tracing::trace!(event = %event, "No subscription for event");
            return 0;
        }

        let connection_id = subscriptions.connection_id();
        for _ in 0..matches {
            let record = InboundRecord {
                payload: payload.clone(),
                event: event.to_string(),
                connection_id: connection_id.to_string(),
                static_properties: self.registry.get_properties(connection_id),
            };
            self.sink.deliver(record).await;
            BridgeMetrics::record_inbound(event);
        }

        matches
    }
}
