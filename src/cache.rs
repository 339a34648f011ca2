use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::fetch_stats::{FetchSnapshot, FetchStats};
use crate::fetcher::{DatasetSource, FetchError};
use crate::models::{ChainRow, Dataset, Table};
use crate::registry::{Category, DatasetKind, Registry};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct Entry {
    dataset: Dataset,
    expires_at: Instant,
}

/// Read-through cache of decoded datasets with an absolute expiry per entry.
///
/// Concurrent misses on one kind share a single fetch. Failures are never stored, so the
/// next call after a failed fetch goes back to the source. Expiry is judged by the
/// injected [`Clock`]; moka's own time-to-live only evicts what that clock already
/// considers stale.
pub struct DatasetCache<S, C> {
    registry: Registry,
    source: S,
    clock: C,
    ttl: Duration,
    entries: Cache<DatasetKind, Entry>,
    stats: FetchStats,
}

impl<S: DatasetSource, C: Clock> DatasetCache<S, C> {
    pub fn new(registry: Registry, source: S, clock: C, ttl: Duration) -> Self {
        Self {
            registry,
            source,
            clock,
            ttl,
            entries: Cache::builder().time_to_live(ttl).build(),
            stats: FetchStats::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stats(&self) -> FetchSnapshot {
        self.stats.snapshot()
    }

    pub async fn get(&self, kind: DatasetKind) -> Result<Dataset, Arc<FetchError>> {
        let cached = self.entries.entry(kind).or_try_insert_with(self.load(kind)).await?;
        if cached.is_fresh() {
            return Ok(cached.into_value().dataset);
        }
        if self.clock.now() < cached.value().expires_at {
            self.stats.inc_cache_hits();
            return Ok(cached.into_value().dataset);
        }

        self.entries.invalidate(&kind).await;
        let reloaded = self.entries.entry(kind).or_try_insert_with(self.load(kind)).await?;
        if !reloaded.is_fresh() {
            self.stats.inc_cache_hits();
        }
        Ok(reloaded.into_value().dataset)
    }

    /// Typed variant of [`Self::get`].
    pub async fn table<R: ChainRow>(&self) -> Result<Table<R>, Arc<FetchError>> {
        let dataset = self.get(R::KIND).await?;
        let actual = dataset.kind();
        R::from_dataset(dataset).ok_or_else(|| {
            Arc::new(FetchError::KindMismatch {
                expected: R::KIND,
                actual,
            })
        })
    }

    async fn load(&self, kind: DatasetKind) -> Result<Entry, FetchError> {
        let target = self.registry.resolve(Category::Transfers, kind);
        self.stats.inc_network_fetches();
        let fetched = match self.source.fetch(target).await {
            Ok(body) => {
                Dataset::decode(kind, &body).map_err(|source| FetchError::Decode { kind, source })
            }
            Err(err) => Err(err),
        };

        match fetched {
            Ok(dataset) => {
                debug!(dataset = %kind, rows = dataset.len(), "fetched dataset");
                Ok(Entry {
                    dataset,
                    expires_at: self.clock.now() + self.ttl,
                })
            }
            Err(err) => {
                self.stats.inc_fetch_failures();
                warn!(dataset = %kind, "fetch failed: {}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use url::Url;

    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{DistributionRow, OverviewRow};

    /// Serves canned bodies per URL and counts every call.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        bodies: Mutex<HashMap<Url, Result<String, u16>>>,
    }

    impl CountingSource {
        fn serve(&self, url: &Url, body: &str) {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.clone(), Ok(body.to_string()));
        }

        fn fail(&self, url: &Url, status: u16) {
            self.bodies.lock().unwrap().insert(url.clone(), Err(status));
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DatasetSource for Arc<CountingSource> {
        async fn fetch(&self, target: &Url) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = self.bodies.lock().unwrap().get(target).cloned();
            let status = match body {
                Some(Ok(body)) => return Ok(body.into_bytes()),
                Some(Err(status)) => status,
                None => 404,
            };
            Err(FetchError::Status {
                url: target.clone(),
                status: reqwest::StatusCode::from_u16(status).unwrap(),
            })
        }
    }

    fn setup() -> (
        DatasetCache<Arc<CountingSource>, Arc<ManualClock>>,
        Arc<CountingSource>,
        Arc<ManualClock>,
    ) {
        let registry = Registry::new(&Url::parse("http://query.test").unwrap()).unwrap();
        let source = Arc::new(CountingSource::default());
        let clock = Arc::new(ManualClock::new());
        source.serve(
            registry.resolve(Category::Transfers, DatasetKind::Overview),
            r#"[{"Blockchain":"Ethereum","Volume":10},{"Blockchain":"Polygon","Volume":5}]"#,
        );
        let cache = DatasetCache::new(
            registry,
            Arc::clone(&source),
            Arc::clone(&clock),
            DEFAULT_TTL,
        );
        (cache, source, clock)
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_is_served_from_cache() {
        let (cache, source, clock) = setup();

        let first = cache.table::<OverviewRow>().await.unwrap();
        clock.advance(Duration::from_secs(599));
        let second = cache.table::<OverviewRow>().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(cache.stats().cache_hits, 1);
        assert_eq!(cache.stats().network_fetches, 1);
    }

    #[tokio::test]
    async fn fetch_after_ttl_goes_back_to_the_network() {
        let (cache, source, clock) = setup();

        let first = cache.table::<OverviewRow>().await.unwrap();
        clock.advance(Duration::from_secs(600));
        let second = cache.table::<OverviewRow>().await.unwrap();

        assert_eq!(source.calls(), 2);
        assert!(!first.ptr_eq(&second));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (cache, source, _clock) = setup();
        let url = cache
            .registry()
            .resolve(Category::Transfers, DatasetKind::Distribution)
            .clone();
        source.fail(&url, 500);

        assert!(cache.table::<DistributionRow>().await.is_err());
        source.serve(&url, r#"[{"Blockchain":"Ethereum","Bucket":"<100","Volume":1}]"#);
        let table = cache.table::<DistributionRow>().await.unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_decode_error() {
        let (cache, source, _clock) = setup();
        let url = cache
            .registry()
            .resolve(Category::Transfers, DatasetKind::Daily)
            .clone();
        source.serve(&url, r#"{"message":"rate limited"}"#);

        let err = cache.get(DatasetKind::Daily).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            FetchError::Decode {
                kind: DatasetKind::Daily,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn kinds_are_cached_independently() {
        let (cache, source, _clock) = setup();
        let url = cache
            .registry()
            .resolve(Category::Transfers, DatasetKind::Daily)
            .clone();
        source.serve(&url, "[]");

        cache.get(DatasetKind::Overview).await.unwrap();
        cache.get(DatasetKind::Daily).await.unwrap();
        cache.get(DatasetKind::Overview).await.unwrap();
        cache.get(DatasetKind::Daily).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let (cache, source, _clock) = setup();

        let (first, second, third) = tokio::join!(
            cache.table::<OverviewRow>(),
            cache.table::<OverviewRow>(),
            cache.table::<OverviewRow>(),
        );

        assert_eq!(source.calls(), 1);
        let first = first.unwrap();
        assert!(first.ptr_eq(&second.unwrap()));
        assert!(first.ptr_eq(&third.unwrap()));
        assert_eq!(cache.stats().network_fetches, 1);
    }
}
