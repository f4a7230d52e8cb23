// ── Reconnect backoff ──

use std::time::Duration;

/// Exponential backoff bounds.
///
/// `delay = min(base * 2^attempt, ceiling)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first reconnection attempt. Default: 5s.
    pub base: Duration,
    /// Upper bound on any single delay. Default: 60s.
    pub ceiling: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(5),
            ceiling: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Delay after `attempt` consecutive failures (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.ceiling, |delay| delay.min(self.ceiling))
    }
}

/// Attempt counter over a [`BackoffPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay for the current failure, advancing the counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Back to the base delay after a successful message.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_until_ceiling() {
        let mut backoff = Backoff::new(BackoffPolicy::default());
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, [5, 10, 20, 40, 60, 60]);
        assert_eq!(backoff.attempt(), 6);
    }

    #[test]
    fn delays_never_decrease_and_stay_capped() {
        let policy = BackoffPolicy {
            base: Duration::from_millis(300),
            ceiling: Duration::from_secs(7),
        };
        let mut backoff = Backoff::new(policy);
        let mut previous = Duration::ZERO;
        for _ in 0..64 {
            let delay = backoff.next_delay();
            assert!(delay >= previous, "{delay:?} < {previous:?}");
            assert!(delay <= policy.ceiling);
            previous = delay;
        }
        assert_eq!(previous, policy.ceiling);
    }

    #[test]
    fn reset_returns_to_base() {
        let mut backoff = Backoff::new(BackoffPolicy::default());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }
}
