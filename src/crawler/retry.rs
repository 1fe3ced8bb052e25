//! Bounded retry policy
//!
//! A fixed number of attempts with a fixed delay between them. Which errors are worth
//! another attempt is decided by a predicate supplied per call, so the same policy can
//! wrap any fallible async operation.

use crate::config::ResilienceConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry ceiling and inter-attempt delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },

    /// An attempt failed with an error the predicate refused to retry
    Fatal(E),
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` counts the first try and is at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `op` until it succeeds, fails fatally, or the attempts run out
    ///
    /// `op` receives the 1-based attempt number. The delay is slept between attempts
    /// only, never after the last one.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, is_retryable: P) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(RetryError::Fatal(e)),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl From<&ResilienceConfig> for RetryPolicy {
    fn from(config: &ResilienceConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_delay())
    }
}
