use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of cache activity, for host metrics or logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Calls served from the cache without a fetch.
    pub hits: u64,
    /// Successful refreshes: fetch, resource build and publish all worked.
    pub refreshes: u64,
    pub fetch_failures: u64,
    pub build_failures: u64,
    /// Failed closes of superseded resources. Logged, never propagated.
    pub close_failures: u64,
}

/// Counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) hits: AtomicU64,
    pub(crate) refreshes: AtomicU64,
    pub(crate) fetch_failures: AtomicU64,
    pub(crate) build_failures: AtomicU64,
    pub(crate) close_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            build_failures: self.build_failures.load(Ordering::Relaxed),
            close_failures: self.close_failures.load(Ordering::Relaxed),
        }
    }
}
