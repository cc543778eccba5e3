//! The seam to the remote authority that issues time-limited credentials.

use anyhow::Result;
use async_trait::async_trait;

use crate::cache::token::TokenGrant;

/// Issues a fresh credential for a logical key (e.g. a message type).
///
/// The cache calls this only while holding the key's refresh lock, so at most
/// one fetch per key is in flight at a time. Implementations must stay safe
/// to call again after an error: the cache retries according to its
/// [`RetrySettings`](crate::RetrySettings), and callers retry by calling
/// [`get_token`](crate::TokenCache::get_token) again.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<TokenGrant>;
}
