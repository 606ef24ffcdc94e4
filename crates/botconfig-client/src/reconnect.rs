//! Reconnect backoff.
//!
//! Each unsolicited disconnect doubles the delay within `[min, max]` seconds;
//! a successful handshake or transport open resets it. With the default
//! bounds consecutive failures wait 1, 2, 4, 5, 5, ... seconds.

use std::time::Duration;

/// Doubling backoff clamped to whole-second bounds.
#[derive(Clone, Debug)]
pub struct ReconnectPolicy {
    min_secs: u64,
    max_secs: u64,
    current_secs: u64,
}

impl ReconnectPolicy {
    /// Create a policy with the given bounds. `min` is raised to at least 1
    /// and `max` to at least `min`.
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        let min_secs = min_secs.max(1);
        Self {
            min_secs,
            max_secs: max_secs.max(min_secs),
            current_secs: 0,
        }
    }

    /// Advance and return the next delay.
    pub fn next_delay(&mut self) -> Duration {
        self.current_secs = self
            .current_secs
            .saturating_mul(2)
            .max(self.min_secs)
            .clamp(self.min_secs, self.max_secs);
        Duration::from_secs(self.current_secs)
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        self.current_secs = 0;
    }

    /// Last delay handed out, zero after a reset.
    pub fn current(&self) -> Duration {
        Duration::from_secs(self.current_secs)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(1, 5)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn secs(policy: &mut ReconnectPolicy, n: usize) -> Vec<u64> {
        (0..n).map(|_| policy.next_delay().as_secs()).collect()
    }

    #[test]
    fn default_sequence() {
        let mut policy = ReconnectPolicy::default();
        assert_eq!(policy.current(), Duration::ZERO);
        assert_eq!(secs(&mut policy, 6), vec![1, 2, 4, 5, 5, 5]);
    }

    #[test]
    fn reset_restarts_at_min() {
        let mut policy = ReconnectPolicy::default();
        let _ = secs(&mut policy, 4);
        policy.reset();
        assert_eq!(policy.current(), Duration::ZERO);
        assert_eq!(secs(&mut policy, 2), vec![1, 2]);
    }

    #[test]
    fn custom_bounds() {
        let mut policy = ReconnectPolicy::new(3, 20);
        assert_eq!(secs(&mut policy, 5), vec![3, 6, 12, 20, 20]);
    }

    #[test]
    fn degenerate_bounds_are_repaired() {
        let mut policy = ReconnectPolicy::new(0, 0);
        assert_eq!(secs(&mut policy, 3), vec![1, 1, 1]);
    }

    proptest! {
        #[test]
        fn delay_stays_within_bounds(min in 1_u64..60, extra in 0_u64..600, steps in 1_usize..40) {
            let max = min + extra;
            let mut policy = ReconnectPolicy::new(min, max);
            let mut prior = 0;
            for _ in 0..steps {
                let next = policy.next_delay().as_secs();
                prop_assert!((min..=max).contains(&next));
                prop_assert!(next >= prior);
                prop_assert_eq!(next, (prior * 2).max(min).min(max));
                prior = next;
            }
        }
    }
}
