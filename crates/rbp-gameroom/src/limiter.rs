use std::time::Instant;

/// Per-user token bucket on `game_action` messages (spec.md §4.2 "refill
/// 10/s, burst 20"). Violators receive an `error` and are not forwarded to
/// the engine.
pub struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self { tokens: capacity, capacity, refill_per_sec, last: Instant::now() }
    }
    /// Attempts to consume one token, refilling first for elapsed time.
    pub fn try_acquire(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new(20.0, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_exhaust() {
        let mut bucket = TokenBucket::default();
        for _ in 0..20 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }
}
