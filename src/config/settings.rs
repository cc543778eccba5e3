use std::time::Duration;

use serde::Deserialize;

use crate::resilience::retry::RetrySettings;

/// Treat a token as due for refresh this long before its actual expiry, to
/// absorb clock skew against the issuing authority and in-flight latency.
pub const SAFETY_MARGIN_SECONDS_DEFAULT: u64 = 120;

/// ================================
/// Cache-wide settings
/// ================================
///
/// Embeddable in a host application's configuration file. Every field is
/// optional and falls back to the defaults above.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheSettings {
    pub safety_margin_seconds: Option<u64>,
    pub retry: Option<RetryConfig>,
}

impl CacheSettings {
    /// Effective safety margin: the configured value or the default.
    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(
            self.safety_margin_seconds
                .unwrap_or(SAFETY_MARGIN_SECONDS_DEFAULT),
        )
    }

    /// Effective retry policy: a single attempt unless a retry block opts in.
    pub fn retry_settings(&self) -> RetrySettings {
        self.retry
            .as_ref()
            .map(RetryConfig::settings)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be multiplied by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// max delay for retrying
    /// invariant: >= base_delay_ms
    pub max_delay_ms: Option<u64>,
}

impl RetryConfig {
    pub fn settings(&self) -> RetrySettings {
        RetrySettings {
            attempts: self.attempts.unwrap_or(3),
            base_delay: Duration::from_millis(self.base_delay_ms.unwrap_or(200)),
            max_delay: Duration::from_millis(self.max_delay_ms.unwrap_or(1000)),
        }
    }
}
