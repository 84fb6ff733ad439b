use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;

use crate::BackoffConfig;

/// Exponential backoff for the retries of a single write.
///
/// The first retry waits for the minimum delay, every further retry doubles it up to the maximum
/// delay. There is no jitter. After the configured number of retries, [`can_retry`] returns
/// `false`.
///
/// [`can_retry`]: Self::can_retry
#[derive(Debug)]
pub struct RetryBackoff {
    backoff: ExponentialBackoff,
    min_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
    attempt: u32,
}

impl RetryBackoff {
    /// Creates a new backoff. The elapsed time starts counting now.
    pub fn new(config: &BackoffConfig) -> Self {
        let min_delay = config.min_delay();
        let max_delay = config.max_delay();

        let backoff = ExponentialBackoff {
            current_interval: min_delay,
            initial_interval: min_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: max_delay,
            max_elapsed_time: None,
            ..Default::default()
        };

        Self {
            backoff,
            min_delay,
            max_delay,
            max_retries: config.max_retries,
            attempt: 0,
        }
    }

    /// Returns the number of retries scheduled so far.
    ///
    /// The initial attempt is attempt `0`.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns `true` if the retry budget allows another retry.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_retries
    }

    /// Returns the time since the backoff was created.
    pub fn elapsed(&self) -> Duration {
        self.backoff.get_elapsed_time()
    }

    /// Returns the delay before the next retry and counts the retry.
    pub fn next_backoff(&mut self) -> Duration {
        self.attempt += 1;
        let delay = self.backoff.next_backoff().unwrap_or(self.max_delay);
        delay.max(self.min_delay).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min_delay_ms: u64, max_delay_ms: u64, max_retries: u32) -> BackoffConfig {
        BackoffConfig {
            min_delay_ms,
            max_delay_ms,
            max_retries,
        }
    }

    #[test]
    fn test_exponential_bounded() {
        let mut backoff = RetryBackoff::new(&config(100, 1_000, 10));
        let delays: Vec<_> = (0..6).map(|_| backoff.next_backoff().as_millis()).collect();
        assert_eq!(delays, [100, 200, 400, 800, 1_000, 1_000]);
        assert_eq!(backoff.attempt(), 6);
    }

    #[test]
    fn test_budget() {
        let mut backoff = RetryBackoff::new(&config(1, 10, 2));
        assert!(backoff.can_retry());
        backoff.next_backoff();
        assert!(backoff.can_retry());
        backoff.next_backoff();
        assert!(!backoff.can_retry());
    }

    #[test]
    fn test_zero_budget() {
        let backoff = RetryBackoff::new(&config(1, 10, 0));
        assert!(!backoff.can_retry());
    }

    #[test]
    fn test_min_above_max_is_clamped() {
        let mut backoff = RetryBackoff::new(&config(500, 100, 3));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(100));
    }
}
