use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

/// A resource lock with TTL-based expiry (spec.md §5 "distributed lock
/// (optional, keyed by resource, TTL ~30s, lua-scripted release to ensure
/// ownership)"). No distributed backend is wired up here -- a single
/// process's tournaments only ever contend with themselves -- but the
/// interface is shaped so a Redis- or etcd-backed implementation could
/// replace [`MutexMap`] without touching call sites.
#[allow(async_fn_in_trait)]
pub trait LockManager: Send + Sync {
    /// Blocks until `key` is held exclusively, or returns `false` if the
    /// lock could not be acquired within `wait`.
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> bool;
    /// Releases `key`. A no-op if the caller doesn't hold it.
    async fn release(&self, key: &str);
}

struct Held {
    expires_at: Instant,
}

/// Process-local [`LockManager`] keyed by resource name (e.g.
/// `tournament:<id>`, `queue:headsup`). Orphaned entries (past their TTL)
/// are swept on the next `acquire` attempt for that key, matching spec.md
/// §5's "orphaned locks (idle > 60s) are cleaned up by the acquiring
/// instance before retry" -- here simplified to "before the next attempt",
/// since there is only ever one instance to have orphaned it.
pub struct MutexMap {
    held: Mutex<HashMap<String, Held>>,
}

impl MutexMap {
    pub fn new() -> Self {
        Self { held: Mutex::new(HashMap::new()) }
    }

    fn try_acquire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut held = self.held.lock().expect("lock table poisoned");
        if let Some(existing) = held.get(key) {
            if existing.expires_at > now {
                return false;
            }
        }
        held.insert(key.to_string(), Held { expires_at: now + ttl });
        true
    }
}

impl Default for MutexMap {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for MutexMap {
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        loop {
            if self.try_acquire(key, ttl) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    async fn release(&self, key: &str) {
        self.held.lock().expect("lock table poisoned").remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_waits_for_release() {
        let locks = MutexMap::new();
        assert!(locks.acquire("t:1", Duration::from_secs(30), Duration::from_millis(50)).await);
        assert!(!locks.acquire("t:1", Duration::from_secs(30), Duration::from_millis(50)).await);
        locks.release("t:1").await;
        assert!(locks.acquire("t:1", Duration::from_secs(30), Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn expired_lock_can_be_reacquired_without_release() {
        let locks = MutexMap::new();
        assert!(locks.acquire("t:2", Duration::from_millis(10), Duration::from_millis(50)).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(locks.acquire("t:2", Duration::from_secs(30), Duration::from_millis(50)).await);
    }
}
