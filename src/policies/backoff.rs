//! # Retry backoff for failed restart launches.
//!
//! When relaunching a dead worker fails (the OS refuses to create the process),
//! the monitor does not hammer the launcher on every probe pass. The delay for
//! the `n`-th consecutive failure (0-indexed) is `first × factor^n`, clamped to
//! `max`, then jittered. The base is derived from `n` alone, so jitter never
//! feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{BackoffPolicy, JitterPolicy};
//!
//! let retry = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(4),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(retry.next(0), Duration::from_millis(250));
//! assert_eq!(retry.next(2), Duration::from_secs(1));
//! assert_eq!(retry.next(8), Duration::from_secs(4));
//! ```

use std::time::Duration;

use crate::policies::JitterPolicy;

/// Exponential retry backoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failed relaunch.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 1s`, `factor = 2.0`, `max = 60s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Delay for the given 0-indexed failure count.
    ///
    /// Non-finite or negative intermediate values clamp to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter,
        }
    }

    #[test]
    fn grows_exponentially_without_jitter() {
        let p = policy(JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(100));
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(3), Duration::from_millis(800));
    }

    #[test]
    fn constant_factor_keeps_first() {
        let p = BackoffPolicy {
            factor: 1.0,
            ..policy(JitterPolicy::None)
        };
        for attempt in 0..8 {
            assert_eq!(p.next(attempt), Duration::from_millis(100));
        }
    }

    #[test]
    fn first_above_max_is_clamped() {
        let p = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            ..policy(JitterPolicy::None)
        };
        assert_eq!(p.next(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_clamps_to_max() {
        let p = policy(JitterPolicy::None);
        assert_eq!(p.next(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_full_base() {
        let p = policy(JitterPolicy::Equal);
        for attempt in 0..12 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(30_000.0) as u64;
            let d = p.next(attempt);
            assert!(d >= Duration::from_millis(base_ms / 2), "attempt {attempt}: {d:?}");
            assert!(d <= Duration::from_millis(base_ms), "attempt {attempt}: {d:?}");
        }
    }

    #[test]
    fn full_jitter_never_exceeds_base() {
        let p = policy(JitterPolicy::Full);
        for attempt in 0..12 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(30_000.0) as u64;
            assert!(p.next(attempt) <= Duration::from_millis(base_ms));
        }
    }
}
