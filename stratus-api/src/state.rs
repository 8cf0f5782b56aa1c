//! App state: config, cache connection, weather service.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use stratus_cache::{MemoryCacheStore, RedisCacheStore};
use stratus_core::constants::{DEFAULT_PROVIDER_BASE_URL, DEFAULT_PROVIDER_TIMEOUT_SECONDS};
use stratus_core::error::{Result, StratusError};
use stratus_core::traits::CacheStore;
use stratus_provider::{ProviderConfig, VisualCrossingClient};
use stratus_weather::WeatherService;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Server configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Listening port.
    pub port: u16,
    /// Listening address.
    pub bind_addr: String,
    /// `None` selects the in-process cache.
    pub redis_url: Option<String>,
    /// Refuse to start when the cache is unreachable.
    pub cache_required: bool,
    /// Share one provider call between concurrent misses for a city.
    pub coalesce_requests: bool,
    /// Outbound weather API settings.
    pub provider: ProviderConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            redis_url: None,
            cache_required: true,
            coalesce_requests: false,
            provider: ProviderConfig::new(""),
        }
    }
}

impl ApiConfig {
    /// Reads the configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, one variable at a time.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("WEATHER_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| StratusError::ConfigError("WEATHER_API_KEY is not set".into()))?;

        let provider = ProviderConfig::new(api_key)
            .with_base_url(
                lookup("WEATHER_API_BASE_URL").unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.into()),
            )
            .with_timeout(parse_var(
                &lookup,
                "PROVIDER_TIMEOUT_SECONDS",
                DEFAULT_PROVIDER_TIMEOUT_SECONDS,
            )?);

        Ok(Self {
            port: parse_var(&lookup, "PORT", DEFAULT_PORT)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            redis_url: lookup("REDIS_URL").filter(|u| !u.trim().is_empty()),
            cache_required: flag(&lookup, "CACHE_REQUIRED", true),
            coalesce_requests: flag(&lookup, "COALESCE_REQUESTS", false),
            provider,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StratusError::ConfigError(format!("{} has an invalid value: {:?}", name, raw))),
        None => Ok(default),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: bool) -> bool {
    lookup(name)
        .map(|v| {
            let v = v.trim();
            !(v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") || v == "0")
        })
        .unwrap_or(default)
}

/// Connects the configured cache backend.
///
/// Returns `Ok(None)` only in degraded mode: the store was unreachable and
/// `cache_required` is off.
pub async fn connect_cache(config: &ApiConfig) -> Result<Option<Arc<dyn CacheStore>>> {
    let Some(url) = &config.redis_url else {
        info!("REDIS_URL not set, using in-memory cache");
        return Ok(Some(Arc::new(MemoryCacheStore::new())));
    };

    match RedisCacheStore::connect(url).await {
        Ok(store) => Ok(Some(Arc::new(store))),
        Err(e) if e.is_cache_error() && !config.cache_required => {
            warn!(error = %e, "Cache unreachable, serving without cache");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Shared state handed to every handler.
pub struct AppState {
    /// Configuration the state was built from.
    pub config: ApiConfig,
    /// Cache-aside lookup service.
    pub service: WeatherService,
    /// When the state was built, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Builds state around an already-wired service.
    pub fn new(config: ApiConfig, service: WeatherService) -> Self {
        Self {
            config,
            service,
            started_at: Instant::now(),
        }
    }

    /// Connects the cache and builds the provider client.
    ///
    /// The state only exists once the cache is reachable (or degraded mode was
    /// chosen), so no request can run against an unconnected store.
    pub async fn connect(config: ApiConfig) -> Result<Self> {
        let provider = VisualCrossingClient::with_config(config.provider.clone())?;

        let mut service = WeatherService::new(Arc::new(provider))
            .with_coalescing(config.coalesce_requests);
        if let Some(cache) = connect_cache(&config).await? {
            service = service.with_cache(cache);
        }

        info!(
            provider = service.provider_name(),
            cache = service.cache_backend(),
            coalescing = service.is_coalescing(),
            "Weather service ready"
        );
        Ok(Self::new(config, service))
    }
}
