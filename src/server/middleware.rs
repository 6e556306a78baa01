use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, Result};

use super::AppState;

const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects `/api/v1` requests whose `X-API-Key` does not match `api.key`.
/// Without a configured key every request passes.
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response> {
    if let Some(expected) = state.settings.api.key.as_deref() {
        check_api_key(req.headers(), expected)?;
    }
    Ok(next.run(req).await)
}

fn check_api_key(headers: &HeaderMap, expected: &str) -> Result<()> {
    match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(key) if key == expected => Ok(()),
        Some(_) => {
            tracing::warn!("Rejected pipeline request with wrong API key");
            Err(AppError::Unauthorized("invalid API key".to_string()))
        }
        None => {
            tracing::warn!("Rejected pipeline request without API key");
            Err(AppError::Unauthorized(format!("missing {} header", API_KEY_HEADER)))
        }
    }
}
