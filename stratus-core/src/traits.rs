//! Common traits for Stratus.
//!
//! The lookup service only talks to its collaborators through these
//! interfaces, so backends can be swapped and faked in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::WeatherPayload;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key-value store with per-entry expiration.
///
/// Implementations might use:
/// - Redis (shared between service instances)
/// - An in-process map (single instance, development, tests)
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value for `key`.
    ///
    /// Never-written and expired keys both return `Ok(None)`; callers cannot
    /// and need not tell them apart.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`.
    ///
    /// After `ttl` has elapsed, `get` returns `None` for the key. Before that,
    /// `get` returns `value` unchanged unless the backend evicted it.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEATHER PROVIDER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the external weather data source.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Issues exactly one outbound request for `city` and returns the body.
    ///
    /// # Errors
    /// - [`StratusError::UnknownCity`](crate::StratusError::UnknownCity) when the
    ///   provider rejects the request as a bad request
    /// - any other provider variant for transport, status or payload failures
    async fn fetch(&self, city: &str) -> Result<WeatherPayload>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}
