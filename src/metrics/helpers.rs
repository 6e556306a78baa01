//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::connection_manager::RegistryStats;
use crate::router::DispatchResult;

use super::{
    CONNECTIONS_CLOSED, CONNECTIONS_OPENED, CONNECTIONS_TOTAL, CONNECTION_DURATION,
    DISPATCHES_TOTAL, INBOUND_EVENTS_TOTAL, INBOUND_INVALID_TOTAL, MESSAGES_DELIVERED_TOTAL,
    MESSAGES_FAILED_TOTAL, ROOMS_ACTIVE, ROOM_JOINS_TOTAL, ROOM_LEAVES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording connection metrics
pub struct ConnectionMetrics;

impl ConnectionMetrics {
    pub fn record_opened() {
        CONNECTIONS_OPENED.inc();
    }

    /// Record a closed session and its duration
    pub fn record_closed(duration_secs: f64) {
        CONNECTIONS_CLOSED.inc();
        CONNECTION_DURATION.observe(duration_secs);
    }

    /// Refresh gauges from a registry snapshot
    pub fn update_from_stats(stats: &RegistryStats) {
        CONNECTIONS_TOTAL.set(stats.total_connections as i64);
        ROOMS_ACTIVE.set(stats.rooms.len() as i64);
    }
}

/// Helper struct for recording inbound metrics
pub struct BridgeMetrics;

impl BridgeMetrics {
    pub fn record_inbound(event: &str) {
        INBOUND_EVENTS_TOTAL.with_label_values(&[event]).inc();
    }

    pub fn record_invalid_frame() {
        INBOUND_INVALID_TOTAL.inc();
    }
}

/// Helper struct for recording outbound metrics
pub struct RouterMetrics;

impl RouterMetrics {
    pub fn record_dispatch(result: &DispatchResult) {
        DISPATCHES_TOTAL
            .with_label_values(&[result.mode.as_str()])
            .inc();
        MESSAGES_DELIVERED_TOTAL.inc_by(result.delivered as u64);
        MESSAGES_FAILED_TOTAL.inc_by(result.failed as u64);
    }
}

/// Helper struct for recording room metrics
pub struct RoomMetrics;

impl RoomMetrics {
    pub fn record_join() {
        ROOM_JOINS_TOTAL.inc();
    }

    pub fn record_leave() {
        ROOM_LEAVES_TOTAL.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::EmitMode;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        RouterMetrics::record_dispatch(&DispatchResult {
            mode: EmitMode::Room,
            delivered: 2,
            failed: 0,
        });
        BridgeMetrics::record_inbound("chat");

        let output = encode_metrics().unwrap();
        assert!(output.contains("socket_bridge_dispatches_total"));
        assert!(output.contains("socket_bridge_inbound_events_total"));
    }
}
