//! Service constants for Stratus.
//!
//! Cache key layout, entry lifetime and provider defaults.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix of every weather cache key (`weather:{city}`).
pub const CACHE_KEY_PREFIX: &str = "weather:";

/// Lifetime of a cached weather payload in seconds (12 hours).
pub const CACHE_TTL_SECONDS: u64 = 43_200;

/// Lifetime of a cached weather payload.
pub const CACHE_TTL: Duration = Duration::from_secs(CACHE_TTL_SECONDS);

/// Default capacity of the in-process cache backend.
pub const DEFAULT_MEMORY_CACHE_ENTRIES: usize = 10_000;

// ═══════════════════════════════════════════════════════════════════════════════
// WEATHER PROVIDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Default host of the Visual Crossing weather API.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://weather.visualcrossing.com";

/// Path of the timeline endpoint; the city is appended as one more segment.
pub const PROVIDER_TIMELINE_PATH: &str = "VisualCrossingWebServices/rest/services/timeline";

/// Unit system requested from the provider.
pub const PROVIDER_UNIT_GROUP: &str = "metric";

/// Content type requested from the provider.
pub const PROVIDER_CONTENT_TYPE: &str = "json";

/// Default outbound request timeout in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// CLIENT-FACING MESSAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Message returned when the provider does not know the city.
pub const MESSAGE_CITY_NOT_FOUND: &str = "City not found.";

/// Message returned for every other failure.
pub const MESSAGE_INTERNAL_ERROR: &str = "Something went wrong.";
