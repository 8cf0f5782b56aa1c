//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use stratus_weather::LookupSource;

use crate::dto::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Response header telling whether the body came from the cache.
pub const X_CACHE: &str = "x-cache";

/// GET /weather/:city
pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Result<Response> {
    let lookup = state.service.lookup(&city).await?;

    let cache_status = match lookup.source {
        LookupSource::Cache => "HIT",
        LookupSource::Provider => "MISS",
    };
    debug!(city = %city, cache = cache_status, bytes = lookup.payload.len(), "Serving weather");

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::HeaderName::from_static(X_CACHE), HeaderValue::from_static(cache_status)),
        ],
        lookup.payload.into_string(),
    )
        .into_response())
}

/// GET /health
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        cache: state.service.cache_backend().into(),
        coalescing: state.service.is_coalescing(),
    })
}
