// tests/common/mod.rs
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cache::token::TokenGrant;
use crate::helpers::time::now_u64;
use crate::resource::ManagedResource;
use crate::sources::fetch::TokenSource;

/// Install a compact tracing subscriber once per test binary.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Remote-authority stub: hands out scripted outcomes per key, in order,
/// and counts every fetch.
#[derive(Default)]
pub struct ScriptedSource {
    fetches: AtomicUsize,
    delays: Mutex<HashMap<String, Duration>>,
    scripts: Mutex<HashMap<String, VecDeque<Result<TokenGrant>>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_grant(&self, key: &str, value: &str, ttl_seconds: u64) {
        self.push(key, Ok(TokenGrant::new(value, now_u64() + ttl_seconds)));
    }

    pub fn push_error(&self, key: &str, message: &str) {
        self.push(key, Err(anyhow!("{message}")));
    }

    /// Every fetch for `key` sleeps this long, holding the refresh open.
    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.delays.lock().insert(key.to_owned(), delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn push(&self, key: &str, outcome: Result<TokenGrant>) {
        self.scripts
            .lock()
            .entry(key.to_owned())
            .or_default()
            .push_back(outcome);
    }
}

#[async_trait]
impl TokenSource for ScriptedSource {
    async fn fetch(&self, key: &str) -> Result<TokenGrant> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.scripts
            .lock()
            .get_mut(key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(anyhow!("no scripted response left for key {key}")))
    }
}

/// Resource stub recording successful closes in a shared counter.
#[derive(Debug)]
pub struct CountingResource {
    closes: Arc<AtomicUsize>,
    fail_first_close: bool,
    attempts: AtomicUsize,
}

impl CountingResource {
    pub fn new(closes: Arc<AtomicUsize>) -> Self {
        Self {
            closes,
            fail_first_close: false,
            attempts: AtomicUsize::new(0),
        }
    }

    /// The first close errors; any later close succeeds.
    pub fn failing_once(closes: Arc<AtomicUsize>) -> Self {
        Self {
            closes,
            fail_first_close: true,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ManagedResource for CountingResource {
    async fn close(&self) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_first_close && attempt == 0 {
            return Err(anyhow!("close refused"));
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub async fn build_counting(closes: Arc<AtomicUsize>) -> Result<CountingResource> {
    Ok(CountingResource::new(closes))
}

pub async fn build_failing_once(closes: Arc<AtomicUsize>) -> Result<CountingResource> {
    Ok(CountingResource::failing_once(closes))
}

pub async fn build_failing(message: &'static str) -> Result<CountingResource> {
    Err(anyhow!("{message}"))
}

/// Poll `cond` until it holds or `deadline` passes.
pub async fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
