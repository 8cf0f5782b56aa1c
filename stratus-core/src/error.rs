//! Error types for Stratus.
//!
//! This module provides the error hierarchy using `thiserror`.
//! Errors are `Clone` so that one provider result can be handed to every
//! request waiting on a coalesced fetch.

use thiserror::Error;

/// Result type alias using `StratusError`.
pub type Result<T> = std::result::Result<T, StratusError>;

/// Main error type for all Stratus operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StratusError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The cache backend could not be reached.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A cache command was sent but failed.
    #[error("Cache {operation} failed: {reason}")]
    CacheOperation { operation: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The provider rejected the request as a bad request, read as "unknown city".
    #[error("Unknown city: {0}")]
    UnknownCity(String),

    /// The provider answered with a non-success status.
    #[error("Weather provider returned HTTP {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("Weather provider request failed: {0}")]
    ProviderTransport(String),

    /// The outbound request timed out.
    #[error("Weather provider timed out after {seconds}s")]
    ProviderTimeout { seconds: u64 },

    /// The body is not a well-formed JSON document.
    #[error("Invalid weather payload: {0}")]
    InvalidPayload(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StratusError {
    /// Returns true if this error came from the cache backend.
    ///
    /// Cache errors never fail a request; the lookup bypasses the cache instead.
    pub fn is_cache_error(&self) -> bool {
        matches!(
            self,
            StratusError::CacheUnavailable(_) | StratusError::CacheOperation { .. }
        )
    }

    /// Returns true if this error came from the weather provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            StratusError::UnknownCity(_)
                | StratusError::ProviderStatus { .. }
                | StratusError::ProviderTransport(_)
                | StratusError::ProviderTimeout { .. }
                | StratusError::InvalidPayload(_)
        )
    }

    /// Shorthand for a failed cache command.
    pub fn cache_op(operation: impl Into<String>, reason: impl ToString) -> Self {
        StratusError::CacheOperation {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for StratusError {
    fn from(err: serde_json::Error) -> Self {
        StratusError::InvalidPayload(err.to_string())
    }
}
