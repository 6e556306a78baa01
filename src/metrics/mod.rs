//! Prometheus metrics for the socket bridge.
//!
//! - Connection metrics (live connections, opened/closed, session duration)
//! - Inbound event metrics by event name
//! - Outbound dispatch metrics by mode
//! - Room membership changes

mod helpers;

pub use helpers::{encode_metrics, BridgeMetrics, ConnectionMetrics, RoomMetrics, RouterMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "socket_bridge";

lazy_static! {
    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Live socket connections
    pub static ref CONNECTIONS_TOTAL: IntGauge = register_int_gauge!(
        format!("{}_connections_total", METRIC_PREFIX),
        "Number of live socket connections"
    ).unwrap();

    /// Rooms with at least one member
    pub static ref ROOMS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_rooms_active", METRIC_PREFIX),
        "Number of rooms with at least one member"
    ).unwrap();

    pub static ref CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_connections_opened_total", METRIC_PREFIX),
        "Total socket connections opened"
    ).unwrap();

    pub static ref CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_connections_closed_total", METRIC_PREFIX),
        "Total socket connections closed"
    ).unwrap();

    pub static ref CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_connection_duration_seconds", METRIC_PREFIX),
        "Socket session duration in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 1800.0, 3600.0, 14400.0]
    ).unwrap();

    // ============================================================================
    // Bridge Metrics
    // ============================================================================

    /// Inbound records delivered to the pipeline, by event name
    pub static ref INBOUND_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_inbound_events_total", METRIC_PREFIX),
        "Inbound records delivered to the pipeline",
        &["event"]
    ).unwrap();

    /// Frames that could not be parsed as events
    pub static ref INBOUND_INVALID_TOTAL: IntCounter = register_int_counter!(
        format!("{}_inbound_invalid_total", METRIC_PREFIX),
        "Inbound frames that were not valid event frames"
    ).unwrap();

    // ============================================================================
    // Router Metrics
    // ============================================================================

    /// Outbound dispatches by mode
    pub static ref DISPATCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_dispatches_total", METRIC_PREFIX),
        "Outbound dispatches",
        &["mode"]
    ).unwrap();

    pub static ref MESSAGES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_delivered_total", METRIC_PREFIX),
        "Events queued on connections"
    ).unwrap();

    pub static ref MESSAGES_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Events that hit a closed connection queue"
    ).unwrap();

    // ============================================================================
    // Room Metrics
    // ============================================================================

    pub static ref ROOM_JOINS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_room_joins_total", METRIC_PREFIX),
        "Room joins requested by the pipeline"
    ).unwrap();

    pub static ref ROOM_LEAVES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_room_leaves_total", METRIC_PREFIX),
        "Room leaves requested by the pipeline"
    ).unwrap();
}
