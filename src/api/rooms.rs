//! Room membership endpoints.

use std::collections::{BTreeMap, BTreeSet};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::pipeline::HostMessage;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct RoomListResponse {
    pub payload: BTreeMap<String, BTreeSet<String>>,
}

/// POST /api/v1/rooms/join - Join `payload.room`; echoes the message on success, 204 otherwise
pub async fn join_room(
    State(state): State<AppState>,
    Json(message): Json<HostMessage>,
) -> Response {
    match state.rooms.join(message) {
        Some(echo) => Json(echo).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// POST /api/v1/rooms/leave - Leave `payload.room`
pub async fn leave_room(
    State(state): State<AppState>,
    Json(message): Json<HostMessage>,
) -> StatusCode {
    state.rooms.leave(&message);
    StatusCode::NO_CONTENT
}

/// GET /api/v1/rooms - Every room and its members
pub async fn list_rooms(State(state): State<AppState>) -> Json<RoomListResponse> {
    Json(RoomListResponse {
        payload: state.rooms.list_rooms(),
    })
}
