//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::connection_manager::RoomInfo;
use crate::router::RouterStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub connections: ConnectionHealthResponse,
    pub pipeline_subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct ConnectionHealthResponse {
    pub total: usize,
    pub rooms_count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: ConnectionStats,
    pub dispatch: RouterStatsSnapshot,
    pub rules: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub property_entries: usize,
    pub rooms: Vec<RoomInfo>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.registry.stats();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        connections: ConnectionHealthResponse {
            total: stats.total_connections,
            rooms_count: stats.rooms.len(),
        },
        pipeline_subscribers: state.pipeline.subscriber_count(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.registry.stats();

    let mut rooms: Vec<RoomInfo> = stats
        .rooms
        .into_iter()
        .map(|(name, member_count)| RoomInfo { name, member_count })
        .collect();
    rooms.sort_by(|a, b| a.name.cmp(&b.name));

    Json(StatsResponse {
        connections: ConnectionStats {
            total_connections: stats.total_connections,
            property_entries: stats.property_entries,
            rooms,
        },
        dispatch: state.router.stats(),
        rules: state.bridge.rules().to_vec(),
    })
}
