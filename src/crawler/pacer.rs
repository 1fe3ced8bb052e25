//! Request pacing
//!
//! Enforces a minimum gap between consecutive outbound requests. Every attempt counts,
//! including retries and attempts that ended in an error.

use std::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Minimum-interval gate shared by every request the crawler makes
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns how long a request issued now would have to wait
    pub fn time_until_next_request(&self) -> Duration {
        let slot = self.next_slot.lock().map(|guard| *guard).unwrap_or(None);
        slot.map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Waits for this request's slot and reserves the next one
    ///
    /// The first request goes out immediately.
    pub async fn wait(&self) {
        let wait_until = {
            let mut slot = match self.next_slot.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let start = match *slot {
                Some(at) if at > now => at,
                _ => now,
            };
            *slot = Some(start + self.delay);
            start
        };

        tokio::time::sleep_until(wait_until).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_immediate() {
        let pacer = Pacer::new(Duration::from_secs(1));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_requests_spaced() {
        let pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;

        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_counts_toward_gap() {
        let pacer = Pacer::new(Duration::from_millis(500));
        pacer.wait().await;

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(pacer.time_until_next_request(), Duration::ZERO);

        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_delay() {
        let pacer = Pacer::new(Duration::ZERO);
        pacer.wait().await;
        pacer.wait().await;
        assert_eq!(pacer.time_until_next_request(), Duration::ZERO);
    }
}
