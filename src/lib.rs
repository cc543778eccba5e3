//! # Token Cache Library
//!
//! Serves a valid time-limited token per key, fetching from a remote
//! authority on demand, refreshing ahead of expiry behind a per-key lock,
//! and closing the resource attached to a superseded token only after its
//! replacement is visible.
//!
//! Modules:
//! - `cache` — token types and the keyed cache itself
//! - `sources` — the remote-authority seam
//! - `resource` — the closable-resource seam
//! - `resilience` — retry policy applied to remote fetches
//! - `config` — settings types embeddable in a host configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod resource;
pub mod sources;

pub use crate::cache::token::{Token, TokenGrant};
pub use crate::cache::token_cache::TokenCache;
pub use crate::config::settings::{CacheSettings, RetryConfig};
pub use crate::error::TokenError;
pub use crate::observability::stats::CacheStats;
pub use crate::resilience::retry::RetrySettings;
pub use crate::resource::ManagedResource;
pub use crate::sources::fetch::TokenSource;
