//! Bounded retries with exponential backoff.

use std::{future::Future, time::Duration};

use rand::{Rng, SeedableRng};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Adds a random extra of up to half the delay
    pub jitter: bool,
    /// Response statuses worth another attempt
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter: true,
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// The delay before retrying after the given failed attempt (1-based), without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);

        Duration::from_millis(delay_ms)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        if !self.jitter || backoff.is_zero() {
            return backoff;
        }

        let mut rng = rand::rngs::SmallRng::from_entropy();
        let extra_ms = rng.gen_range(0..=backoff.as_millis() as u64 / 2);

        backoff + Duration::from_millis(extra_ms)
    }

    /// Runs `op` until it succeeds, fails with an error `retryable` rejects, or the attempts
    /// run out. `op` receives the 0-based attempt number.
    pub async fn run<F, Fut, T, E, R>(&self, mut op: F, retryable: R) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Debug,
        R: Fn(&E) -> bool,
    {
        let attempts = self.attempts();

        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt + 1 < attempts && retryable(&e) => {
                    attempt += 1;

                    let wait = self.delay(attempt);
                    tracing::warn!(
                        "Attempt {}/{} failed: {:?}, retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        wait
                    );

                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
