//! # Restart policy.
//!
//! [`RestartPolicy`] is loaded once at startup and applies to every worker.
//!
//! ```text
//! worker gone, automatic = false  → unrecoverable, supervisor shuts down
//! worker gone, automatic = true   → sleep(delay) → relaunch
//! relaunch failed n times         → sleep(max(delay, retry.next(n - 1))) → relaunch
//! ```

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global rule for relaunching workers that stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Relaunch dead workers instead of shutting down.
    pub automatic: bool,
    /// Wait before each relaunch.
    pub delay: Duration,
}

impl RestartPolicy {
    /// Automatic restart after `delay`.
    pub const fn automatic(delay: Duration) -> Self {
        Self {
            automatic: true,
            delay,
        }
    }

    /// Any worker loss shuts the supervisor down.
    pub const fn never() -> Self {
        Self {
            automatic: false,
            delay: Duration::ZERO,
        }
    }

    /// Delay before the next relaunch of a worker whose last `failures`
    /// relaunch attempts failed.
    ///
    /// With no prior failures this is exactly [`RestartPolicy::delay`]; afterwards
    /// the retry backoff takes over but never goes below `delay`.
    pub fn delay_before(&self, failures: u32, retry: &BackoffPolicy) -> Duration {
        match failures {
            0 => self.delay,
            n => retry.next(n - 1).max(self.delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::JitterPolicy;

    fn retry() -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(200),
            max: Duration::from_secs(2),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn default_is_no_restart_without_delay() {
        let policy = RestartPolicy::default();
        assert!(!policy.automatic);
        assert_eq!(policy.delay, Duration::ZERO);
        assert_eq!(policy, RestartPolicy::never());
    }

    #[test]
    fn first_restart_uses_configured_delay() {
        let policy = RestartPolicy::automatic(Duration::from_millis(500));
        assert_eq!(policy.delay_before(0, &retry()), Duration::from_millis(500));
    }

    #[test]
    fn failed_restarts_back_off_but_not_below_delay() {
        let policy = RestartPolicy::automatic(Duration::from_millis(500));
        assert_eq!(policy.delay_before(1, &retry()), Duration::from_millis(500));
        assert_eq!(policy.delay_before(2, &retry()), Duration::from_millis(500));
        assert_eq!(policy.delay_before(3, &retry()), Duration::from_millis(800));
        assert_eq!(policy.delay_before(10, &retry()), Duration::from_secs(2));
    }
}
