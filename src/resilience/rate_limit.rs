//! Outbound rate limiting, one token bucket per instance and operation.

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn refill(&mut self, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        self.refill(capacity, refill_rate);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Non-blocking limiter: a call either takes a token now or is refused.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    capacity: f64,
    refill_rate: f64,
}

impl RateLimiter {
    /// `rps` tokens per second, holding at most `burst`.
    pub fn new(rps: u32, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            bucket: Mutex::new(TokenBucket::new(capacity)),
            capacity,
            refill_rate: f64::from(rps),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }

    pub fn try_acquire(&self) -> bool {
        self.bucket.lock().try_acquire(self.capacity, self.refill_rate)
    }

    /// Tokens currently available.
    pub fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        bucket.refill(self.capacity, self.refill_rate);
        bucket.tokens
    }
}
