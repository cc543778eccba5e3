use thiserror::Error;

/// Errors surfaced by [`TokenCache::get_token`](crate::TokenCache::get_token).
///
/// Failures to close a superseded resource never appear here. A refresh that
/// has already published its token must not fail afterwards, so close errors
/// are logged and counted instead.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The remote authority call failed. The cached entry for the key, if
    /// any, is left untouched so the next call can try again.
    #[error("token fetch for key `{key}` failed")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Building the attached resource from a fresh credential failed. The
    /// credential is discarded; a token is never cached without its resource.
    #[error("resource build for key `{key}` failed")]
    Build {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Tokens are cached per key, so the key must not be empty.
    #[error("token key must not be empty")]
    EmptyKey,
}

impl TokenError {
    /// Key the failed operation was for, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            TokenError::Fetch { key, .. } | TokenError::Build { key, .. } => Some(key),
            TokenError::EmptyKey => None,
        }
    }
}
