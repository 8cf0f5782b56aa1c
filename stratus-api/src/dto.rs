//! DTOs for API responses.

use serde::{Deserialize, Serialize};

/// Body of every error response: `{"message": "..."}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the state was built
    pub uptime_seconds: u64,
    /// Cache backend: "redis", "memory" or "disabled"
    pub cache: String,
    /// Whether concurrent misses are coalesced
    pub coalescing: bool,
}
