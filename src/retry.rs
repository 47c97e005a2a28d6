use std::time::Duration;

/// Bounded retry policy for idempotent requests.
///
/// The transport makes `max_retries + 1` attempts in total; delays between
/// attempts grow exponentially from `base_delay`, are capped at `max_delay`,
/// and are jittered by up to `jitter * delay` in either direction.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    jitter: f64,
}

impl RetryPolicy {
    /// Policy that never retries. Use for endpoints whose PUT/DELETE
    /// semantics are not idempotent on the server side.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay.max(Duration::from_millis(1));
        if self.max_delay < self.base_delay {
            self.max_delay = self.base_delay;
        }
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay.max(self.base_delay);
        self
    }

    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.max_retries.saturating_add(1).max(1)
    }

    pub(crate) fn jitter_factor(&self) -> f64 {
        self.jitter
    }

    /// Capped exponential delay before the next attempt, pre-jitter.
    /// `attempt` is 1-based: the delay slept after the first failure is
    /// `backoff_delay(1) == base_delay`.
    pub(crate) fn backoff_delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as u32;
        let multiplier = 1_u128 << exponent;
        let base_ms = self.base_delay.as_millis().max(1);
        let max_ms = self.max_delay.as_millis().max(base_ms);
        let delay_ms = base_ms
            .saturating_mul(multiplier)
            .min(max_ms)
            .min(u64::MAX as u128) as u64;
        Duration::from_millis(delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            jitter: 0.25,
        }
    }
}
