//! Rate limiter using a token bucket
//!
//! Every upstream request takes one token. The bucket is refilled to capacity
//! once per refill interval, so a burst of symbols fetched concurrently stays
//! within the vendor's request budget.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

/// Configuration for the rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum requests allowed per refill interval
    pub max_requests: usize,
    pub refill_interval: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            refill_interval: Duration::from_secs(1),
        }
    }
}

impl RateLimiterConfig {
    pub fn with_rate(mut self, requests: usize) -> Self {
        self.max_requests = requests.max(1);
        self
    }

    pub fn with_refill_interval(mut self, interval: Duration) -> Self {
        self.refill_interval = interval;
        self
    }
}

/// Token bucket shared by clones
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: Arc<Semaphore>,
    capacity: usize,
    last_refill: Arc<Mutex<Instant>>,
    refill_interval: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let capacity = config.max_requests.max(1);
        Self {
            tokens: Arc::new(Semaphore::new(capacity)),
            capacity,
            last_refill: Arc::new(Mutex::new(Instant::now())),
            refill_interval: config.refill_interval,
        }
    }

    pub fn with_rate(requests_per_second: usize) -> Self {
        Self::new(RateLimiterConfig::default().with_rate(requests_per_second))
    }

    /// Wait until a token is available and consume it
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire().await {
                return;
            }
            let wait = {
                let last_refill = self.last_refill.lock().await;
                self.refill_interval.saturating_sub(last_refill.elapsed())
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    /// Consume a token if one is available right now
    pub async fn try_acquire(&self) -> bool {
        self.refill().await;
        match self.tokens.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    async fn refill(&self) {
        let mut last_refill = self.last_refill.lock().await;
        if last_refill.elapsed() >= self.refill_interval {
            let missing = self.capacity.saturating_sub(self.tokens.available_permits());
            if missing > 0 {
                self.tokens.add_permits(missing);
            }
            *last_refill = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_tokens() {
        let limiter = RateLimiter::with_rate(3);
        assert_eq!(limiter.available(), 3);
        assert_eq!(limiter.capacity(), 3);
    }

    #[tokio::test]
    async fn test_zero_rate_is_clamped() {
        let limiter = RateLimiter::with_rate(0);
        assert_eq!(limiter.capacity(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_bucket_rejects_try_acquire() {
        let config = RateLimiterConfig::default()
            .with_rate(2)
            .with_refill_interval(Duration::from_secs(60));
        let limiter = RateLimiter::new(config);

        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.available(), 0);
        assert!(!limiter.try_acquire().await);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_refill() {
        let config = RateLimiterConfig::default()
            .with_rate(1)
            .with_refill_interval(Duration::from_millis(30));
        let limiter = RateLimiter::new(config);

        limiter.acquire().await;
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_clones_share_tokens() {
        let limiter = RateLimiter::with_rate(2);
        let other = limiter.clone();
        limiter.acquire().await;
        assert_eq!(other.available(), 1);
    }
}
