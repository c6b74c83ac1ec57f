//! Rate-limit aware retry around single remote calls.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::app::{GazetteError, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

static RATE_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rate limited, retry after (\d+)|FLOOD_WAIT \((\d+)\)")
        .expect("rate limit pattern is valid")
});

/// Extract the server's wait hint, in seconds, from an error message.
pub fn rate_limit_hint(message: &str) -> Option<u64> {
    let caps = RATE_LIMIT.captures(message)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct RequestRetrier {
    max_attempts: u32,
    requests_since_limit: AtomicU64,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RequestRetrier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RequestRetrier {
    pub fn new(max_attempts: u32) -> Self {
        Self::with_sleeper(max_attempts, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(max_attempts: u32, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            requests_since_limit: AtomicU64::new(0),
            sleeper,
        }
    }

    /// Calls made since the last rate limit was hit.
    #[cfg(test)]
    pub fn requests_since_limit(&self) -> u64 {
        self.requests_since_limit.load(Ordering::SeqCst)
    }

    /// Run `op`, sleeping and retrying while it reports a rate limit.
    ///
    /// The wait is the server's hint plus the number of calls made since the
    /// previous limit, so backoff grows with call pressure. Errors that do not
    /// carry a rate-limit hint are returned as-is on the first failure.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let pressure = self.requests_since_limit.fetch_add(1, Ordering::SeqCst) + 1;

            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(hint) = rate_limit_hint(&err.to_string()) else {
                return Err(err);
            };

            if attempt >= self.max_attempts {
                return Err(GazetteError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let wait = hint + pressure;
            self.requests_since_limit.store(0, Ordering::SeqCst);
            warn!(
                "rate limited (hint {}s), sleeping {}s before attempt {}/{}",
                hint,
                wait,
                attempt + 1,
                self.max_attempts
            );
            self.sleeper.sleep(Duration::from_secs(wait)).await;
        }
    }
}
