use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::connection::{get_properties, list_connections};
use super::emit::emit;
use super::events::inbound_events;
use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::rooms::{join_room, leave_room, list_rooms};

/// Pipeline endpoints, nested under `/api/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Outbound
        .route("/emit", post(emit))
        // Rooms
        .route("/rooms", get(list_rooms))
        .route("/rooms/join", post(join_room))
        .route("/rooms/leave", post(leave_room))
        // Connections
        .route("/connections", get(list_connections))
        .route("/connections/{id}/properties", get(get_properties))
        // Inbound
        .route("/events", get(inbound_events))
}

/// Health, stats and metrics at the root
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
}
