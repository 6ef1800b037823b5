//! Token bucket rate limiting.
//!
//! Each client owns a bucket holding up to `burst` tokens that refills
//! continuously at `rate_per_minute / 60` tokens per second. A request takes
//! one token; with less than one token left it is denied and told how many
//! whole seconds to wait.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// How often idle buckets are swept, and how long a bucket may sit idle.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Slack for float refill error: `elapsed * rate / 60` can land just under a
/// whole token after exactly `60 / rate` seconds.
const TOKEN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub rate_per_minute: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_per_minute: 60,
            burst: 10,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucketLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl TokenBucketLimiter {
    pub fn new(rate_per_minute: u32, burst: u32) -> Self {
        Self::with_config(RateLimitConfig {
            rate_per_minute,
            burst,
        })
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    fn tokens_per_second(&self) -> f64 {
        self.config.rate_per_minute as f64 / 60.0
    }

    // A panic while holding the lock cannot leave a bucket half-updated.
    fn buckets(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens =
            (bucket.tokens + elapsed * self.tokens_per_second()).min(self.config.burst as f64);
        bucket.last_refill = now;
    }

    /// Admits or denies one request from `client`.
    /// Returns `Err(retry_after_secs)` when denied; the wait is at least 1.
    pub fn is_allowed(&self, client: &str) -> Result<(), u64> {
        self.is_allowed_at(client, Instant::now())
    }

    pub fn is_allowed_at(&self, client: &str, now: Instant) -> Result<(), u64> {
        let mut buckets = self.buckets();
        let burst = self.config.burst as f64;
        let bucket = buckets.entry(client.to_string()).or_insert(Bucket {
            tokens: burst,
            last_refill: now,
        });
        self.refill(bucket, now);

        if bucket.tokens + TOKEN_EPSILON >= 1.0 {
            bucket.tokens = (bucket.tokens - 1.0).max(0.0);
            return Ok(());
        }

        let wait = ((1.0 - bucket.tokens) / self.tokens_per_second()).ceil() as u64;
        Err(wait.max(1))
    }

    /// Whole tokens `client` could spend right now.
    pub fn remaining(&self, client: &str) -> u32 {
        self.remaining_at(client, Instant::now())
    }

    pub fn remaining_at(&self, client: &str, now: Instant) -> u32 {
        let mut buckets = self.buckets();
        match buckets.get_mut(client) {
            Some(bucket) => {
                self.refill(bucket, now);
                (bucket.tokens + TOKEN_EPSILON).floor() as u32
            }
            None => self.config.burst,
        }
    }

    /// Drops buckets idle for longer than `max_idle`. Returns how many went.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        self.cleanup_at(max_idle, Instant::now())
    }

    pub fn cleanup_at(&self, max_idle: Duration, now: Instant) -> usize {
        let mut buckets = self.buckets();
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= max_idle);
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_burst_then_deny_then_refill() {
        let limiter = TokenBucketLimiter::new(60, 10);
        let start = Instant::now();

        for _ in 0..10 {
            assert_eq!(limiter.is_allowed_at("1.2.3.4", start), Ok(()));
        }
        assert_eq!(limiter.is_allowed_at("1.2.3.4", start), Err(1));

        let later = start + Duration::from_secs(1);
        assert_eq!(limiter.is_allowed_at("1.2.3.4", later), Ok(()));
        assert!(limiter.is_allowed_at("1.2.3.4", later).is_err());
    }

    #[test]
    fn test_one_token_after_exact_refill_interval_for_any_rate() {
        for rate in 1..=120u32 {
            let limiter = TokenBucketLimiter::new(rate, 1);
            let start = Instant::now();

            assert!(limiter.is_allowed_at("c", start).is_ok());
            assert!(limiter.is_allowed_at("c", start).is_err());

            let refilled = start + Duration::from_secs_f64(60.0 / rate as f64);
            assert_eq!(
                limiter.is_allowed_at("c", refilled),
                Ok(()),
                "rate {} denied after one refill interval",
                rate
            );
            assert!(limiter.is_allowed_at("c", refilled).is_err());
        }
    }

    #[test]
    fn test_retry_after_rounds_up() {
        // 6 per minute: one token every 10 seconds.
        let limiter = TokenBucketLimiter::new(6, 1);
        let start = Instant::now();

        assert!(limiter.is_allowed_at("c", start).is_ok());
        assert_eq!(limiter.is_allowed_at("c", start), Err(10));
        assert_eq!(
            limiter.is_allowed_at("c", start + Duration::from_millis(2500)),
            Err(8)
        );
    }

    #[test]
    fn test_refill_is_capped_at_burst() {
        let limiter = TokenBucketLimiter::new(60, 3);
        let start = Instant::now();
        limiter.is_allowed_at("c", start).unwrap();

        let much_later = start + Duration::from_secs(3600);

        assert_eq!(limiter.remaining_at("c", much_later), 3);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = TokenBucketLimiter::new(60, 1);
        let now = Instant::now();

        assert!(limiter.is_allowed_at("a", now).is_ok());
        assert!(limiter.is_allowed_at("a", now).is_err());
        assert!(limiter.is_allowed_at("b", now).is_ok());
    }

    #[test]
    fn test_remaining_for_unknown_client_is_burst() {
        let limiter = TokenBucketLimiter::new(60, 7);
        assert_eq!(limiter.remaining("nobody"), 7);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_cleanup_removes_idle_buckets() {
        let limiter = TokenBucketLimiter::new(60, 5);
        let start = Instant::now();
        limiter.is_allowed_at("idle", start).unwrap();
        limiter
            .is_allowed_at("active", start + Duration::from_secs(3000))
            .unwrap();

        let removed = limiter.cleanup_at(Duration::from_secs(3600), start + Duration::from_secs(3700));

        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.remaining_at("active", start + Duration::from_secs(3700)), 5);
    }

    #[test]
    fn test_concurrent_requests_never_overspend() {
        let limiter = Arc::new(TokenBucketLimiter::new(1, 50));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.is_allowed_at("shared", now).is_ok())
                        .count()
                })
            })
            .collect();
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(allowed, 50);
    }
}
