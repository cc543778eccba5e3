//! The closable-resource seam.

use anyhow::Result;
use async_trait::async_trait;

/// A live handle derived from a credential (e.g. a queue client) that must
/// be released once its owning token is superseded or evicted.
///
/// The cache closes a resource only after the replacement token is visible
/// to readers. Implementations must tolerate a repeated close without
/// erroring, and a close failure must leave the process healthy: the cache
/// logs it and moves on.
#[async_trait]
pub trait ManagedResource: Send + Sync + 'static {
    async fn close(&self) -> Result<()>;
}

/// For callers whose tokens carry no derived handle.
#[async_trait]
impl ManagedResource for () {
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
