//! Backoff between failed delivery attempts.

use std::time::Duration;

/// Delay added after each consecutive failure.
pub const DEFAULT_RETRY_STEP: Duration = Duration::from_secs(5);

/// Upper bound on the delay between attempts.
pub const DEFAULT_RETRY_CAP: Duration = Duration::from_secs(10 * 60);

/// Linear, capped backoff.
///
/// The delay before the next attempt after `n` consecutive failures of the
/// same request is `min(n * step, cap)`. Failures of one request never carry
/// over to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub step: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            step: DEFAULT_RETRY_STEP,
            cap: DEFAULT_RETRY_CAP,
        }
    }
}

impl RetryPolicy {
    pub fn new(step: Duration, cap: Duration) -> Self {
        Self { step, cap }
    }

    /// Delay to wait after `failures` consecutive failures.
    pub fn delay_after(&self, failures: u32) -> Duration {
        self.step.saturating_mul(failures).min(self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.step, Duration::from_secs(5));
        assert_eq!(policy.cap, Duration::from_secs(600));
    }

    #[test]
    fn zero_failures_means_no_wait() {
        assert_eq!(RetryPolicy::default().delay_after(0), Duration::ZERO);
    }

    #[test]
    fn delay_grows_by_step_until_capped() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;

        for failures in 1..=200u32 {
            let delay = policy.delay_after(failures);
            let expected = (Duration::from_secs(5) * failures).min(Duration::from_secs(600));
            assert_eq!(delay, expected, "failures = {failures}");
            assert!(delay >= previous);
            previous = delay;
        }

        assert_eq!(policy.delay_after(1), Duration::from_secs(5));
        assert_eq!(policy.delay_after(2), Duration::from_secs(10));
        assert_eq!(policy.delay_after(119), Duration::from_secs(595));
        assert_eq!(policy.delay_after(120), Duration::from_secs(600));
        assert_eq!(policy.delay_after(121), Duration::from_secs(600));
    }

    #[test]
    fn huge_failure_counts_saturate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(600));
    }
}
