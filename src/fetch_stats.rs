use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FetchStats {
    network_fetches: AtomicU64,
    cache_hits: AtomicU64,
    fetch_failures: AtomicU64,
}

impl FetchStats {
    pub fn inc_network_fetches(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FetchSnapshot {
    pub network_fetches: u64,
    pub cache_hits: u64,
    pub fetch_failures: u64,
}
