//! Fixed-window rate limiting for tollbooth.
//!
//! Each `(caller key, route key)` pair gets an independent counting window.
//! The window store is behind the [`WindowStore`] trait so a multi-instance
//! deployment can swap the in-memory store for a shared counter service
//! without touching the algorithm.
//!
//! Windows are ephemeral by design: losing them on restart fails open to
//! "allowed", which is an accepted tradeoff for a process-local limiter.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod memory;

pub use memory::MemoryWindowStore;

use std::time::{Duration, Instant};

/// Rate limit configuration for a route.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Length of the counting window.
    pub window: Duration,

    /// Maximum requests allowed per window.
    pub limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            limit: 10,
        }
    }
}

/// The outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,

    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Time until the current window resets.
    pub reset_in: Duration,
}

impl RateLimitDecision {
    /// Retry-after hint in whole seconds, rounded up.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn retry_after_secs(&self) -> u64 {
        (self.reset_in.as_millis() as u64).div_ceil(1000)
    }

    /// Window reset hint in whole seconds, rounded up.
    #[must_use]
    pub fn reset_secs(&self) -> u64 {
        self.retry_after_secs()
    }
}

/// A store of per-key counting windows.
///
/// Implementations must serialize increments for the same key while letting
/// distinct keys proceed without contention.
pub trait WindowStore: Send + Sync {
    /// Count a request against `(caller_key, route_key)` and decide whether
    /// it is allowed at `now`.
    fn check(
        &self,
        caller_key: &str,
        route_key: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> RateLimitDecision;
}

/// Derive the rate-limiting caller key from forwarding headers.
///
/// Takes the first IP in the forwarded-for header, falls back to the
/// real-ip header, and finally to the literal `"unknown"`. Callers that
/// collide under `"unknown"` share a window; that is a known limitation.
#[must_use]
pub fn derive_caller_key(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    if let Some(header) = forwarded_for {
        if let Some(first) = header.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    if let Some(ip) = real_ip {
        let trimmed = ip.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_key_takes_first_forwarded_ip() {
        let key = derive_caller_key(Some("203.0.113.9, 10.0.0.1"), Some("10.0.0.2"));
        assert_eq!(key, "203.0.113.9");
    }

    #[test]
    fn caller_key_falls_back_to_real_ip() {
        let key = derive_caller_key(None, Some("10.0.0.2"));
        assert_eq!(key, "10.0.0.2");

        let key = derive_caller_key(Some("   "), Some("10.0.0.2"));
        assert_eq!(key, "10.0.0.2");
    }

    #[test]
    fn caller_key_falls_back_to_unknown() {
        assert_eq!(derive_caller_key(None, None), "unknown");
        assert_eq!(derive_caller_key(Some(""), Some("")), "unknown");
    }

    #[test]
    fn retry_after_rounds_up() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_in: Duration::from_millis(1200),
        };
        assert_eq!(decision.retry_after_secs(), 2);

        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_in: Duration::from_millis(2000),
        };
        assert_eq!(decision.retry_after_secs(), 2);
    }
}
