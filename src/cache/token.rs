use std::time::Duration;

use crate::helpers::time::now_u64;

/// Credential as issued by the remote authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Opaque credential string.
    pub value: String,
    /// Expiry in the authority's clock domain. UNIX timestamp, seconds.
    pub expires_at_unix_ts: u64,
}

impl TokenGrant {
    pub fn new(value: impl Into<String>, expires_at_unix_ts: u64) -> Self {
        Self {
            value: value.into(),
            expires_at_unix_ts,
        }
    }
}

/// A cached credential together with the live resource built from it.
///
/// Replaced as a whole on refresh, never mutated in place, so a reader
/// holding one always sees a credential and its resource from the same
/// fetch.
#[derive(Debug)]
pub struct Token<R> {
    key: String,
    value: String,
    expires_at_unix_ts: u64,
    resource: R,
}

impl<R> Token<R> {
    pub(crate) fn new(key: String, grant: TokenGrant, resource: R) -> Self {
        Self {
            key,
            value: grant.value,
            expires_at_unix_ts: grant.expires_at_unix_ts,
            resource,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The credential itself.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at_unix_ts(&self) -> u64 {
        self.expires_at_unix_ts
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// True once the token is past its expiry or within `safety_margin` of
    /// it.
    pub fn needs_refresh(&self, safety_margin: Duration) -> bool {
        let now = now_u64();
        if self.expires_at_unix_ts <= now {
            return true;
        }
        self.expires_at_unix_ts - now < safety_margin.as_secs()
    }
}
