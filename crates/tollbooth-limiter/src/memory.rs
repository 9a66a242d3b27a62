//! In-memory, sharded window store.
//!
//! Keys are spread across a fixed number of mutex-guarded shards so that
//! unrelated callers never contend on the same lock, while increments for a
//! single key are serialized by its shard.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Instant;

use crate::{RateLimitConfig, RateLimitDecision, WindowStore};

const SHARD_COUNT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    caller: String,
    route: String,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Process-local window store.
pub struct MemoryWindowStore {
    shards: Vec<Mutex<HashMap<WindowKey, Window>>>,
}

impl MemoryWindowStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let shards = (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect();
        Self { shards }
    }

    fn shard_for(&self, key: &WindowKey) -> &Mutex<HashMap<WindowKey, Window>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() as usize) % SHARD_COUNT;
        &self.shards[index]
    }
}

impl Default for MemoryWindowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowStore for MemoryWindowStore {
    fn check(
        &self,
        caller_key: &str,
        route_key: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> RateLimitDecision {
        let key = WindowKey {
            caller: caller_key.to_string(),
            route: route_key.to_string(),
        };

        let mut shard = self
            .shard_for(&key)
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let window = shard.entry(key).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(window.started_at);
        if elapsed >= config.window {
            window.started_at = now;
            window.count = 0;
        }

        window.count = window.count.saturating_add(1);
        let allowed = window.count <= config.limit;
        let remaining = config.limit.saturating_sub(window.count);
        let reset_in = config
            .window
            .saturating_sub(now.saturating_duration_since(window.started_at));

        if !allowed {
            tracing::debug!(
                caller = %caller_key,
                route = %route_key,
                count = window.count,
                limit = config.limit,
                "rate limit exceeded"
            );
        }

        RateLimitDecision {
            allowed,
            remaining,
            reset_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(limit: u32, window_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            window: Duration::from_millis(window_ms),
            limit,
        }
    }

    #[test]
    fn first_request_opens_window() {
        let store = MemoryWindowStore::new();
        let now = Instant::now();

        let decision = store.check("caller", "route", &config(10, 60_000), now);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 9);
        assert_eq!(decision.reset_in, Duration::from_millis(60_000));
    }

    #[test]
    fn requests_over_limit_are_denied() {
        let store = MemoryWindowStore::new();
        let now = Instant::now();
        let config = config(3, 60_000);

        for expected_remaining in [2, 1, 0] {
            let decision = store.check("caller", "route", &config, now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let decision = store.check("caller", "route", &config, now);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn window_resets_after_expiry() {
        let store = MemoryWindowStore::new();
        let now = Instant::now();
        let config = config(2, 1_000);

        store.check("caller", "route", &config, now);
        store.check("caller", "route", &config, now);
        assert!(!store.check("caller", "route", &config, now).allowed);

        let later = now + Duration::from_millis(1_000);
        let decision = store.check("caller", "route", &config, later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
        assert_eq!(decision.reset_in, Duration::from_millis(1_000));
    }

    #[test]
    fn distinct_pairs_do_not_interfere() {
        let store = MemoryWindowStore::new();
        let now = Instant::now();
        let config = config(1, 60_000);

        assert!(store.check("caller-a", "route-1", &config, now).allowed);
        assert!(!store.check("caller-a", "route-1", &config, now).allowed);

        // Same caller, different route: fresh quota.
        assert!(store.check("caller-a", "route-2", &config, now).allowed);
        // Different caller, same route: fresh quota.
        assert!(store.check("caller-b", "route-1", &config, now).allowed);
    }

    #[test]
    fn reset_in_counts_down_within_window() {
        let store = MemoryWindowStore::new();
        let now = Instant::now();
        let config = config(10, 10_000);

        store.check("caller", "route", &config, now);
        let decision = store.check("caller", "route", &config, now + Duration::from_millis(4_000));
        assert_eq!(decision.reset_in, Duration::from_millis(6_000));
    }

    #[test]
    fn concurrent_checks_for_one_key_never_overshoot() {
        use std::sync::Arc;

        let store = Arc::new(MemoryWindowStore::new());
        let config = config(50, 60_000);
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut allowed = 0u32;
                    for _ in 0..25 {
                        if store.check("caller", "route", &config, now).allowed {
                            allowed += 1;
                        }
                    }
                    allowed
                })
            })
            .collect();

        let total_allowed: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total_allowed, 50);
    }
}
