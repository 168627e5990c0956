use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use super::error::ApiError;
use super::routes::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Whether the headers carry the expected key. Always true when no key is configured.
pub fn is_authorized(headers: &HeaderMap, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(key) => headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == key),
    }
}

/// Rejects requests without the configured `X-API-Key`.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_authorized(request.headers(), state.api_key.as_deref()) {
        warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
