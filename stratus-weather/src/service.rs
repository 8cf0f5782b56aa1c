//! Cache-aside weather lookup.
//!
//! ```text
//! CACHE_LOOKUP ── hit ──────────────────────────────► payload (Cache)
//!      │
//!     miss ─► PROVIDER_CALL ── ok ──► STORE ────────► payload (Provider)
//!                   │
//!                   └──── err ──────────────────────► error
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use stratus_core::constants::CACHE_TTL;
use stratus_core::error::Result;
use stratus_core::traits::{CacheStore, WeatherProvider};
use stratus_core::types::{CacheKey, WeatherPayload};

use crate::flight::FlightGroup;

/// Where a lookup's payload came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupSource {
    /// Served from the cache, no provider call.
    Cache,
    /// Fetched from the provider (possibly shared with concurrent requests).
    Provider,
}

/// Result of a successful lookup.
#[derive(Clone, Debug)]
pub struct Lookup {
    /// The provider document, unmodified.
    pub payload: WeatherPayload,
    /// Where it came from.
    pub source: LookupSource,
}

/// Weather lookup with a read-through cache.
///
/// The cache is optional: without one (degraded mode) every lookup goes to
/// the provider. Cache failures never fail a lookup.
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
    flights: Option<Arc<FlightGroup<WeatherPayload>>>,
}

impl WeatherService {
    /// Creates a service with no cache and no coalescing.
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            cache: None,
            ttl: CACHE_TTL,
            flights: None,
        }
    }

    /// Puts `cache` in front of the provider.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Overrides the entry lifetime (12 hours by default).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enables or disables single-flight for concurrent misses.
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.flights = enabled.then(|| Arc::new(FlightGroup::new()));
        self
    }

    /// Name of the cache backend, or `"disabled"`.
    pub fn cache_backend(&self) -> &'static str {
        self.cache.as_ref().map_or("disabled", |c| c.backend_name())
    }

    /// Name of the weather provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Returns true if concurrent misses are coalesced.
    pub fn is_coalescing(&self) -> bool {
        self.flights.is_some()
    }

    /// Returns the weather document for `city`.
    ///
    /// # Errors
    /// Provider errors are returned as-is; cache errors are logged and bypassed.
    #[instrument(skip(self))]
    pub async fn lookup(&self, city: &str) -> Result<Lookup> {
        let key = CacheKey::for_city(city);

        if let Some(payload) = self.read_cache(&key).await {
            info!("Cache HIT");
            return Ok(Lookup {
                payload,
                source: LookupSource::Cache,
            });
        }

        info!("Cache MISS");
        let fetch = fetch_and_store(
            self.provider.clone(),
            self.cache.clone(),
            key.clone(),
            self.ttl,
        );

        let payload = match &self.flights {
            Some(flights) => flights.run(key.as_str(), move || fetch).await?,
            None => fetch.await?,
        };

        Ok(Lookup {
            payload,
            source: LookupSource::Provider,
        })
    }

    async fn read_cache(&self, key: &CacheKey) -> Option<WeatherPayload> {
        let cache = self.cache.as_ref()?;

        match cache.get(key.as_str()).await {
            Ok(Some(value)) => match WeatherPayload::from_json(value) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, bypassing cache");
                None
            }
        }
    }
}

/// Fetches from the provider and writes the body back to the cache.
///
/// Owns its inputs so the future can be shared between coalesced callers.
async fn fetch_and_store(
    provider: Arc<dyn WeatherProvider>,
    cache: Option<Arc<dyn CacheStore>>,
    key: CacheKey,
    ttl: Duration,
) -> Result<WeatherPayload> {
    let payload = provider.fetch(key.city()).await?;

    if let Some(cache) = cache {
        match cache.set_with_expiry(key.as_str(), payload.as_str(), ttl).await {
            Ok(()) => debug!(key = %key, ttl_seconds = ttl.as_secs(), "Stored weather in cache"),
            Err(e) => warn!(key = %key, error = %e, "Cache write failed"),
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use stratus_cache::MemoryCacheStore;
    use stratus_core::error::StratusError;
    use tokio::sync::{Barrier, Semaphore};

    const PARIS: &str = r#"{"resolvedAddress":"Paris, France","days":[{"temp":18.2}]}"#;

    enum Gate {
        Open,
        Barrier(Arc<Barrier>),
        Semaphore(Arc<Semaphore>),
    }

    struct FakeProvider {
        calls: AtomicUsize,
        cities: Mutex<Vec<String>>,
        response: Result<String>,
        gate: Gate,
    }

    impl FakeProvider {
        fn ok(body: &str) -> Arc<Self> {
            Self::with_gate(Ok(body.to_string()), Gate::Open)
        }

        fn failing(err: StratusError) -> Arc<Self> {
            Self::with_gate(Err(err), Gate::Open)
        }

        fn with_gate(response: Result<String>, gate: Gate) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                cities: Mutex::new(Vec::new()),
                response,
                gate,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch(&self, city: &str) -> Result<WeatherPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cities.lock().unwrap().push(city.to_string());
            match &self.gate {
                Gate::Open => {}
                Gate::Barrier(barrier) => {
                    barrier.wait().await;
                }
                Gate::Semaphore(sem) => {
                    let _permit = sem.acquire().await.unwrap();
                }
            }
            self.response
                .clone()
                .and_then(WeatherPayload::from_json)
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    /// Cache whose every operation fails.
    struct BrokenCache {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl CacheStore for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(StratusError::CacheUnavailable("connection reset".into()))
        }

        async fn set_with_expiry(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(StratusError::cache_op("SETEX", "connection reset"))
        }

        async fn ping(&self) -> Result<()> {
            Err(StratusError::CacheUnavailable("connection reset".into()))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    fn service(provider: Arc<FakeProvider>, store: Arc<MemoryCacheStore>) -> WeatherService {
        WeatherService::new(provider).with_cache(store)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let provider = FakeProvider::ok(PARIS);
        let store = Arc::new(MemoryCacheStore::new());
        let service = service(provider.clone(), store.clone());

        let first = service.lookup("Paris").await.unwrap();
        assert_eq!(first.source, LookupSource::Provider);
        assert_eq!(first.payload.as_str(), PARIS);
        assert_eq!(provider.calls(), 1);
        assert_eq!(store.get_value("weather:Paris").as_deref(), Some(PARIS));

        let second = service.lookup("Paris").await.unwrap();
        assert_eq!(second.source, LookupSource::Cache);
        assert_eq!(second.payload, first.payload);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_value_served_verbatim() {
        let provider = FakeProvider::ok(PARIS);
        let store = Arc::new(MemoryCacheStore::new());
        let stored = "{ \"hand\" : \"written\" }";
        store.insert("weather:Lyon", stored, CACHE_TTL);

        let lookup = service(provider.clone(), store).lookup("Lyon").await.unwrap();
        assert_eq!(lookup.payload.as_str(), stored);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_city_passed_verbatim_to_provider() {
        let provider = FakeProvider::ok(PARIS);
        let service = service(provider.clone(), Arc::new(MemoryCacheStore::new()));

        service.lookup(" São Paulo ").await.unwrap();
        assert_eq!(provider.cities.lock().unwrap().as_slice(), [" São Paulo ".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_are_case_sensitive() {
        let provider = FakeProvider::ok(PARIS);
        let store = Arc::new(MemoryCacheStore::new());
        let service = service(provider.clone(), store.clone());

        service.lookup("Paris").await.unwrap();
        let lower = service.lookup("paris").await.unwrap();

        assert_eq!(lower.source, LookupSource::Provider);
        assert_eq!(provider.calls(), 2);
        assert!(store.get_value("weather:Paris").is_some());
        assert!(store.get_value("weather:paris").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_twelve_hours() {
        let provider = FakeProvider::ok(PARIS);
        let service = service(provider.clone(), Arc::new(MemoryCacheStore::new()));

        service.lookup("Paris").await.unwrap();

        tokio::time::advance(CACHE_TTL - Duration::from_secs(1)).await;
        assert_eq!(service.lookup("Paris").await.unwrap().source, LookupSource::Cache);
        assert_eq!(provider.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(service.lookup("Paris").await.unwrap().source, LookupSource::Provider);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_city_not_cached() {
        let provider = FakeProvider::failing(StratusError::UnknownCity("Atlantis".into()));
        let store = Arc::new(MemoryCacheStore::new());

        let err = service(provider, store.clone()).lookup("Atlantis").await.unwrap_err();
        assert_eq!(err, StratusError::UnknownCity("Atlantis".into()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_not_cached() {
        let provider = FakeProvider::failing(StratusError::ProviderTransport("connection refused".into()));
        let store = Arc::new(MemoryCacheStore::new());
        let service = service(provider.clone(), store.clone());

        assert!(service.lookup("Paris").await.is_err());
        assert!(service.lookup("Paris").await.is_err());
        assert_eq!(provider.calls(), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_broken_cache_fails_open() {
        let provider = FakeProvider::ok(PARIS);
        let cache = Arc::new(BrokenCache {
            writes: AtomicUsize::new(0),
        });
        let service = WeatherService::new(provider.clone()).with_cache(cache.clone());

        let lookup = service.lookup("Paris").await.unwrap();
        assert_eq!(lookup.payload.as_str(), PARIS);
        assert_eq!(lookup.source, LookupSource::Provider);
        assert_eq!(cache.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched() {
        let provider = FakeProvider::ok(PARIS);
        let store = Arc::new(MemoryCacheStore::new());
        store.insert("weather:Paris", "not json {", CACHE_TTL);

        let lookup = service(provider.clone(), store.clone()).lookup("Paris").await.unwrap();
        assert_eq!(lookup.source, LookupSource::Provider);
        assert_eq!(store.get_value("weather:Paris").as_deref(), Some(PARIS));
    }

    #[tokio::test]
    async fn test_without_cache_always_fetches() {
        let provider = FakeProvider::ok(PARIS);
        let service = WeatherService::new(provider.clone());
        assert_eq!(service.cache_backend(), "disabled");
        assert_eq!(service.provider_name(), "fake");

        service.lookup("Paris").await.unwrap();
        service.lookup("Paris").await.unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_may_both_fetch() {
        // Both calls must be inside the provider at once for the barrier to open.
        let provider = FakeProvider::with_gate(Ok(PARIS.into()), Gate::Barrier(Arc::new(Barrier::new(2))));
        let service = service(provider.clone(), Arc::new(MemoryCacheStore::new()));
        assert!(!service.is_coalescing());

        let (a, b) = tokio::join!(service.lookup("Paris"), service.lookup("Paris"));
        assert_eq!(a.unwrap().payload, b.unwrap().payload);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_coalescing_shares_one_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let provider = FakeProvider::with_gate(Ok(PARIS.into()), Gate::Semaphore(gate.clone()));
        let store = Arc::new(MemoryCacheStore::new());
        let service = service(provider.clone(), store.clone()).with_coalescing(true);
        assert!(service.is_coalescing());

        let (a, b, _) = tokio::join!(
            service.lookup("Paris"),
            service.lookup("Paris"),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                gate.add_permits(1);
            }
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.payload, b.payload);
        assert_eq!(a.source, LookupSource::Provider);
        assert_eq!(b.source, LookupSource::Provider);
        assert_eq!(provider.calls(), 1);
        assert_eq!(store.get_value("weather:Paris").as_deref(), Some(PARIS));
    }

    #[tokio::test]
    async fn test_coalesced_fetch_outlives_dropped_request() {
        let gate = Arc::new(Semaphore::new(0));
        let provider = FakeProvider::with_gate(Ok(PARIS.into()), Gate::Semaphore(gate.clone()));
        let store = Arc::new(MemoryCacheStore::new());
        let service = service(provider.clone(), store.clone()).with_coalescing(true);

        let dropped = tokio::time::timeout(Duration::from_millis(20), service.lookup("Paris")).await;
        assert!(dropped.is_err());

        gate.add_permits(1);
        tokio::time::timeout(Duration::from_secs(1), async {
            while store.get_value("weather:Paris").is_none() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let lookup = service.lookup("Paris").await.unwrap();
        assert_eq!(lookup.source, LookupSource::Cache);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let provider = FakeProvider::ok(PARIS);
        let store = Arc::new(MemoryCacheStore::new());
        let service = service(provider, store.clone()).with_ttl(Duration::from_secs(60));

        service.lookup("Paris").await.unwrap();
        assert_eq!(store.stats().valid_entries, 1);
    }
}
