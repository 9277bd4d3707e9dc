//! Per-client token-bucket rate limiting, grounded on the original gateway's `slowapi.Limiter`
//! (keyed by remote address, configured via `GATEWAY_RATE_LIMIT` requests/minute, 429 on
//! violation) and the wider reference pack's Redis-backed limiter pattern, reproduced here
//! in-memory since the KV backend is an external collaborator (spec §1).

use dashmap::DashMap;
use std::sync::Mutex;
use std::time::Instant;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    capacity_per_minute: u32,
    buckets: DashMap<String, Mutex<Bucket>>,
}

impl RateLimiter {
    pub fn new(capacity_per_minute: u32) -> Self {
        Self {
            capacity_per_minute,
            buckets: DashMap::new(),
        }
    }

    /// True if the caller identified by `key` has a token to spend right now.
    pub fn check(&self, key: &str) -> bool {
        let capacity = self.capacity_per_minute as f64;
        let entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| {
                Mutex::new(Bucket {
                    tokens: capacity,
                    last_refill: Instant::now(),
                })
            });
        let mut bucket = entry.lock().expect("rate limiter bucket lock poisoned");

        let elapsed = bucket.last_refill.elapsed().as_secs_f64();
        let refill_rate = capacity / 60.0;
        bucket.tokens = (bucket.tokens + elapsed * refill_rate).min(capacity);
        bucket.last_refill = Instant::now();

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
