use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use url::Url;

use crate::cache::DatasetCache;
use crate::clock::{Clock, SystemClock};
use crate::fetch_stats::FetchSnapshot;
use crate::fetcher::{DatasetSource, FetchError, HttpSource};
use crate::filter::{available_chains, Selection};
use crate::models::{
    ChainRow, DailyRow, Dataset, DistributionRow, HeatmapRow, OverviewRow, TransferringUserRow,
    WalletTypeRow,
};
use crate::registry::{DatasetKind, Registry};
use crate::view::{self, Datasets, Loaded, Unavailable, ViewSpec};

/// Registry, cache and composer wired together for one deployment.
pub struct Dashboard<S = HttpSource, C = SystemClock> {
    cache: DatasetCache<S, C>,
}

impl Dashboard {
    pub fn connect(base: &Url, ttl: Duration, timeout: Duration) -> Result<Self> {
        let registry = Registry::new(base)?;
        let source = HttpSource::new(timeout)?;
        Ok(Self::new(DatasetCache::new(registry, source, SystemClock, ttl)))
    }
}

impl<S: DatasetSource, C: Clock> Dashboard<S, C> {
    pub fn new(cache: DatasetCache<S, C>) -> Self {
        Self { cache }
    }

    pub fn registry(&self) -> &Registry {
        self.cache.registry()
    }

    pub fn fetch_stats(&self) -> FetchSnapshot {
        self.cache.stats()
    }

    pub async fn dataset(&self, kind: DatasetKind) -> Result<Dataset, Arc<FetchError>> {
        self.cache.get(kind).await
    }

    /// Fetches (or reads from cache) every dataset; each one fails on its own.
    pub async fn load(&self) -> Datasets {
        let (overview, daily, heatmap, distribution, transferring_users, wallet_types) = tokio::join!(
            self.loaded::<OverviewRow>(),
            self.loaded::<DailyRow>(),
            self.loaded::<HeatmapRow>(),
            self.loaded::<DistributionRow>(),
            self.loaded::<TransferringUserRow>(),
            self.loaded::<WalletTypeRow>(),
        );
        Datasets {
            overview,
            daily,
            heatmap,
            distribution,
            transferring_users,
            wallet_types,
        }
    }

    /// Chains offered by the selector, in overview order.
    pub async fn chains(&self) -> Result<Vec<String>, Unavailable> {
        self.loaded::<OverviewRow>()
            .await
            .map(|table| available_chains(&table))
    }

    /// Composes the page for `chains`; `None` selects every chain in the overview.
    pub async fn view(&self, chains: Option<Selection>) -> ViewSpec {
        let datasets = self.load().await;
        let selection = match (chains, &datasets.overview) {
            (Some(selection), _) => selection,
            (None, Ok(overview)) => Selection::all(overview),
            (None, Err(_)) => Selection::default(),
        };
        tracing::debug!(chains = selection.len(), "rendering view");
        view::render(&selection, &datasets)
    }

    async fn loaded<R: ChainRow>(&self) -> Loaded<R> {
        self.cache
            .table::<R>()
            .await
            .map_err(|err| Unavailable {
                dataset: R::KIND,
                reason: err.to_string(),
            })
    }
}
