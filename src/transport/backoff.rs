//! Reconnection policy.
//!
//! Exponential backoff without jitter:
//!
//! ```text
//! delay(attempts) = min(base * 2^attempts, max_delay)
//! ```
//!
//! With the defaults (3 s base, 30 s cap, 5 attempts) the retries fire
//! after 3, 6, 12, 24 and 30 seconds, then stop.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use super::close_code;

// ============================================================================
// Constants
// ============================================================================

/// Default base interval between retries.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3_000);

/// Upper bound on a single backoff delay.
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_millis(30_000);

/// Default retry budget.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Decides whether and when to retry after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Whether abnormal closes are retried at all.
    pub enabled: bool,
    /// Delay before the first retry.
    pub base_interval: Duration,
    /// Cap applied to every delay.
    pub max_delay: Duration,
    /// Retries allowed since the last successful open.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectPolicy {
    /// Creates the default policy.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            base_interval: DEFAULT_RECONNECT_INTERVAL,
            max_delay: DEFAULT_MAX_RECONNECT_DELAY,
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// Creates a policy that never retries.
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Backoff delay after `attempts` failed retries.
    #[must_use]
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
        self.base_interval.saturating_mul(factor).min(self.max_delay)
    }

    /// Returns the delay before the next retry, or `None` to stay closed.
    ///
    /// Normal closure (1000) is terminal regardless of remaining budget.
    #[must_use]
    pub fn next_delay(&self, code: u16, attempts: u32) -> Option<Duration> {
        if !self.enabled || code == close_code::NORMAL || attempts >= self.max_attempts {
            return None;
        }
        Some(self.delay_for(attempts))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let policy = ReconnectPolicy::new();
        let delays: Vec<u64> = (0..5)
            .map(|attempt| policy.delay_for(attempt).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![3_000, 6_000, 12_000, 24_000, 30_000]);
    }

    #[test]
    fn test_normal_closure_is_terminal() {
        let policy = ReconnectPolicy::new();
        assert_eq!(policy.next_delay(close_code::NORMAL, 0), None);
        assert!(policy.next_delay(close_code::ABNORMAL, 0).is_some());
        assert!(policy.next_delay(close_code::POLICY_VIOLATION, 0).is_some());
    }

    #[test]
    fn test_budget_exhaustion() {
        let policy = ReconnectPolicy::new();
        assert!(policy.next_delay(close_code::ABNORMAL, 4).is_some());
        assert_eq!(policy.next_delay(close_code::ABNORMAL, 5), None);
    }

    #[test]
    fn test_disabled_policy() {
        assert_eq!(
            ReconnectPolicy::disabled().next_delay(close_code::ABNORMAL, 0),
            None
        );
    }

    #[test]
    fn test_huge_attempt_count_saturates() {
        let policy = ReconnectPolicy::new();
        assert_eq!(policy.delay_for(200), DEFAULT_MAX_RECONNECT_DELAY);
    }

    proptest! {
        #[test]
        fn prop_delay_matches_formula(base_ms in 1u64..10_000, attempts in 0u32..16) {
            let policy = ReconnectPolicy {
                base_interval: Duration::from_millis(base_ms),
                ..ReconnectPolicy::new()
            };
            let expected = (base_ms * 2u64.pow(attempts)).min(30_000);
            prop_assert_eq!(policy.delay_for(attempts), Duration::from_millis(expected));
        }

        #[test]
        fn prop_delay_is_monotonic_and_capped(attempts in 0u32..64) {
            let policy = ReconnectPolicy::new();
            prop_assert!(policy.delay_for(attempts) <= policy.delay_for(attempts + 1));
            prop_assert!(policy.delay_for(attempts) <= policy.max_delay);
        }
    }
}
