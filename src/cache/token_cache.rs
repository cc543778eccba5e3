use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::cache::token::{Token, TokenGrant};
use crate::config::settings::CacheSettings;
use crate::error::TokenError;
use crate::observability::stats::{CacheStats, Counters};
use crate::resilience::retry::RetrySettings;
use crate::resource::ManagedResource;
use crate::sources::fetch::TokenSource;

/// Keyed cache of time-limited tokens: key -> (credential, resource).
///
/// Serves the cached token for a key while it is clear of the safety margin.
/// Otherwise it fetches a fresh credential from the [`TokenSource`], attaches
/// the resource built by the caller's factory, publishes the new token and
/// only then closes the superseded one's resource. Refreshes serialize per
/// key; the fast path takes a shared read of the token map and no refresh
/// lock.
pub struct TokenCache<R> {
    source: Arc<dyn TokenSource>,
    safety_margin: Duration,
    retry: RetrySettings,
    tokens: RwLock<HashMap<String, Arc<Token<R>>>>,
    /// One refresh lock per key, created on first use and kept for the
    /// lifetime of the cache (key cardinality is message-type scale).
    refresh_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    counters: Arc<Counters>,
}

impl<R: ManagedResource> TokenCache<R> {
    /// Cache with the default safety margin and a single fetch attempt.
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_settings(source, &CacheSettings::default())
    }

    pub fn with_settings(source: Arc<dyn TokenSource>, settings: &CacheSettings) -> Self {
        Self {
            source,
            safety_margin: settings.safety_margin(),
            retry: settings.retry_settings(),
            tokens: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Current token for `key`, fetching first when the cached one is
    /// missing, expired or within the safety margin of its expiry.
    ///
    /// `build_resource` runs at most once per call, with the freshly fetched
    /// credential; the resource it returns lives until the token is
    /// superseded or invalidated. Fetch and build failures leave the cached
    /// entry untouched, so the caller can simply call again. Dropping the
    /// returned future cancels the refresh without publishing anything.
    pub async fn get_token<F, Fut>(
        &self,
        key: &str,
        build_resource: F,
    ) -> Result<Arc<Token<R>>, TokenError>
    where
        F: FnOnce(TokenGrant) -> Fut + Send,
        Fut: Future<Output = anyhow::Result<R>> + Send,
    {
        if key.is_empty() {
            return Err(TokenError::EmptyKey);
        }

        // Fast path, no refresh lock.
        if let Some(token) = self.lookup_fresh(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(token);
        }

        let refresh_lock = self.refresh_lock(key);
        let _guard = refresh_lock.lock().await;

        // Another caller may have refreshed while this one waited.
        if let Some(token) = self.lookup_fresh(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(token);
        }

        debug!(key, "token missing or near expiry, fetching");

        let grant = match self.retry.run_with_retry(|| self.source.fetch(key)).await {
            Ok(grant) => grant,
            Err(source) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                error!(key, error = %source, "token fetch failed");
                return Err(TokenError::Fetch {
                    key: key.to_owned(),
                    source,
                });
            }
        };

        let resource = match build_resource(grant.clone()).await {
            Ok(resource) => resource,
            Err(source) => {
                self.counters.build_failures.fetch_add(1, Ordering::Relaxed);
                error!(key, error = %source, "resource build failed, discarding fetched credential");
                return Err(TokenError::Build {
                    key: key.to_owned(),
                    source,
                });
            }
        };

        let token = Arc::new(Token::new(key.to_owned(), grant, resource));
        let previous = self.tokens.write().insert(key.to_owned(), Arc::clone(&token));

        // The superseded resource is released only after the new token is
        // visible, and off the caller's future: a caller timing out here
        // must not be able to skip the close.
        if let Some(previous) = previous {
            self.spawn_close(previous);
        }

        self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
        info!(key, expires_at = token.expires_at_unix_ts(), "token refreshed");
        Ok(token)
    }

    /// Current entry for `key`, stale or not. Never fetches; lets a caller
    /// fall back to a stale token when a refresh just failed.
    pub fn peek(&self, key: &str) -> Option<Arc<Token<R>>> {
        self.tokens.read().get(key).cloned()
    }

    /// Drop the entry for `key` and close its resource.
    pub async fn invalidate(&self, key: &str) {
        let removed = self.tokens.write().remove(key);
        if let Some(token) = removed {
            self.close_resource(&token).await;
        }
    }

    /// Drop every entry and close every resource.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<Token<R>>> = {
            let mut tokens = self.tokens.write();
            tokens.drain().map(|(_, token)| token).collect()
        };
        for token in drained {
            self.close_resource(&token).await;
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn lookup_fresh(&self, key: &str) -> Option<Arc<Token<R>>> {
        self.tokens
            .read()
            .get(key)
            .filter(|token| !token.needs_refresh(self.safety_margin))
            .cloned()
    }

    fn refresh_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.refresh_locks
            .lock()
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn spawn_close(&self, token: Arc<Token<R>>) {
        let counters = Arc::clone(&self.counters);
        tokio::spawn(async move {
            if let Err(err) = token.resource().close().await {
                counters.close_failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = token.key(), error = %err, "failed to close superseded resource");
            }
        });
    }

    async fn close_resource(&self, token: &Token<R>) {
        if let Err(err) = token.resource().close().await {
            self.counters.close_failures.fetch_add(1, Ordering::Relaxed);
            warn!(key = token.key(), error = %err, "failed to close resource");
        }
    }
}
