use std::time::Duration;

use rand::Rng;

use tubelift_protocol::constants::{MAX_RETRIES, RETRIABLE_STATUS_CODES};

/// Retry and backoff settings for chunk transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive retriable failures tolerated before giving up.
    pub max_retries: u32,
    /// HTTP statuses treated as transient.
    pub retriable_statuses: Vec<u16>,
    /// Exponential base: the sleep cap for attempt `n` is `base^n` seconds.
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retriable_statuses: RETRIABLE_STATUS_CODES.to_vec(),
            backoff_base: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Returns `true` if an HTTP error with this status may be retried.
    pub fn is_retriable_status(&self, status: u16) -> bool {
        self.retriable_statuses.contains(&status)
    }

    /// Returns `true` once `attempt` consecutive failures exceed the ceiling.
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt > self.max_retries
    }

    /// Upper bound (exclusive) of the sleep before retry `attempt`.
    ///
    /// Grows without a time cap; only the attempt ceiling bounds it.
    pub fn max_backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        secs_to_duration(self.backoff_base.powi(exp))
    }

    /// Full-jitter backoff: uniform in `[0, base^attempt)` seconds.
    pub fn backoff<G: Rng + ?Sized>(&self, attempt: u32, rng: &mut G) -> Duration {
        let cap = self.max_backoff(attempt).as_secs_f64();
        secs_to_duration(rng.r#gen::<f64>() * cap)
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Consecutive-failure bookkeeping for one driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    last_error: Option<String>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a retriable failure and returns the new attempt count.
    pub fn record_failure(&mut self, error: impl Into<String>) -> u32 {
        self.attempt = self.attempt.saturating_add(1);
        self.last_error = Some(error.into());
        self.attempt
    }

    /// Clears the failure streak after a successful chunk.
    pub fn reset(&mut self) {
        self.attempt = 0;
        self.last_error = None;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 10);
        assert_eq!(policy.retriable_statuses, vec![500, 502, 503, 504]);
        assert!((policy.backoff_base - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn retriable_statuses() {
        let policy = RetryPolicy::default();
        for status in [500, 502, 503, 504] {
            assert!(policy.is_retriable_status(status), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 501, 505] {
            assert!(!policy.is_retriable_status(status), "{status}");
        }
    }

    #[test]
    fn exhausted_only_after_exceeding_ceiling() {
        let policy = RetryPolicy::default();
        assert!(!policy.exhausted(0));
        assert!(!policy.exhausted(10));
        assert!(policy.exhausted(11));
    }

    #[test]
    fn max_backoff_doubles_without_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_backoff(1), Duration::from_secs(2));
        assert_eq!(policy.max_backoff(2), Duration::from_secs(4));
        assert_eq!(policy.max_backoff(10), Duration::from_secs(1024));
        assert_eq!(policy.max_backoff(20), Duration::from_secs(1 << 20));
    }

    #[test]
    fn max_backoff_saturates_instead_of_panicking() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_backoff(u32::MAX), Duration::MAX);
    }

    #[test]
    fn backoff_within_jitter_bounds() {
        let policy = RetryPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=10 {
            let cap = policy.max_backoff(attempt);
            for _ in 0..200 {
                let delay = policy.backoff(attempt, &mut rng);
                assert!(delay < cap, "attempt {attempt}: {delay:?} >= {cap:?}");
            }
        }
    }

    #[test]
    fn retry_state_counts_and_resets() {
        let mut state = RetryState::new();
        assert_eq!(state.record_failure("503"), 1);
        assert_eq!(state.record_failure("connection reset"), 2);
        assert_eq!(state.last_error(), Some("connection reset"));

        state.reset();
        assert_eq!(state.attempt(), 0);
        assert!(state.last_error().is_none());
    }
}
