use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential reconnect delay: `base * 2^k` for the k-th consecutive
/// failure, capped at `max`. Reset after every successful open.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    max_attempts: Option<u32>,
    failures: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, None)
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, max_attempts: Option<u32>) -> Self {
        Self { base, max: max.max(base), max_attempts, failures: 0 }
    }

    /// Delay before the next attempt, or `None` once `max_attempts`
    /// consecutive failures have been spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(limit) = self.max_attempts
            && self.failures >= limit
        {
            return None;
        }

        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(factor).min(self.max);
        self.failures = self.failures.saturating_add(1);
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures since the last successful open.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
