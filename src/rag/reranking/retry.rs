//! Bounded retry with exponential backoff for remote rerankers
//!
//! - Attempts: one initial call plus `max_retries` retries
//! - Delay: base * 2^retry, capped, with ±25% jitter
//! - Only errors classified by [`RerankError::is_retryable`] are retried;
//!   the last error is returned once attempts run out

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::rag::reranking::RerankError;

/// Default retry count after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;

const BASE_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 2000;

/// Retry policy for reranker calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Policy that makes exactly one attempt
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, RerankError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RerankError>>,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || retry >= self.max_retries => return Err(e),
                Err(e) => {
                    let delay = self.calculate_delay(retry);
                    retry += 1;
                    debug!(error = %e, retry, delay_ms = delay.as_millis() as u64, "retrying reranker call");
                    sleep(delay).await;
                }
            }
        }
    }

    fn calculate_delay(&self, retry: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(retry));
        let delay_ms = exponential.min(self.max_delay_ms);

        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as f64;
            let offset = (rand::random::<f64>() * 2.0 - 1.0) * jitter;
            ((delay_ms as f64) + offset).max(0.0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Upper bound on time spent sleeping, ignoring jitter
    pub fn max_total_wait_time(&self) -> Duration {
        let total_ms = (0..self.max_retries)
            .map(|retry| {
                self.base_delay_ms
                    .saturating_mul(2u64.saturating_pow(retry))
                    .min(self.max_delay_ms)
            })
            .sum();
        Duration::from_millis(total_ms)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
