//! Connection inspection endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::connection_manager::Properties;
use crate::error::{AppError, Result};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ConnectionSummary {
    pub id: String,
    pub connected_at: DateTime<Utc>,
    pub rooms: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionListResponse {
    pub connections: Vec<ConnectionSummary>,
    pub total: usize,
}

/// GET /api/v1/connections - List live connections
pub async fn list_connections(State(state): State<AppState>) -> Json<ConnectionListResponse> {
    let mut connections: Vec<ConnectionSummary> = state
        .registry
        .connections()
        .into_iter()
        .map(|handle| {
            let mut rooms: Vec<String> = handle.rooms.iter().map(|r| r.key().clone()).collect();
            rooms.sort();
            ConnectionSummary {
                id: handle.id.clone(),
                connected_at: handle.connected_at,
                rooms,
            }
        })
        .collect();
    connections.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));

    let total = connections.len();
    Json(ConnectionListResponse { connections, total })
}

/// GET /api/v1/connections/{id}/properties - Custom properties of an identifier
///
/// Properties outlive their connection, so this also answers for disconnected ids.
pub async fn get_properties(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Properties>> {
    state
        .registry
        .get_properties(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No custom properties for '{}'", id)))
}
