//! Outbound emission endpoint.

use axum::{extract::State, Json};

use crate::error::{AppError, Result};
use crate::pipeline::HostMessage;
use crate::router::{DispatchResult, EmitMode};
use crate::server::AppState;

/// POST /api/v1/emit - Route a host message to socket connections
///
/// A message carrying only a property write (`socketIOId` + `socketIOAddStaticProperties`,
/// no event) stores the properties and emits nothing.
#[tracing::instrument(
    name = "http.emit",
    skip(state, message),
    fields(event = ?message.event, emit = ?message.emit)
)]
pub async fn emit(
    State(state): State<AppState>,
    Json(message): Json<HostMessage>,
) -> Result<Json<DispatchResult>> {
    if let Some(record) = message.to_outbound() {
        return Ok(Json(state.router.dispatch(record).await));
    }

    let (Some(connection_id), Some(props)) =
        (message.connection_id.as_deref(), message.add_static_properties)
    else {
        return Err(AppError::Validation("socketIOEvent is required".to_string()));
    };

    state.registry.set_properties(connection_id, props);
    Ok(Json(DispatchResult::skipped(EmitMode::from_host(
        message.emit.as_deref(),
    ))))
}
