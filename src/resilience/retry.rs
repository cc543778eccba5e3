use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::warn;

/// Bounded exponential backoff for operations that are safe to repeat.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Total tries, including the first one.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    /// A single attempt: failures propagate to the caller, which decides
    /// whether to call again.
    fn default() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetrySettings {
    pub async fn run_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay;

        for attempt in 1..=attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    sleep(delay).await;
                    delay = (delay * 2).min(self.max_delay);
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("Retry loop exhausted unexpectedly")
    }
}
