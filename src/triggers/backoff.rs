//! Reconnect delays for the Redis subscription.
//!
//! The delay for attempt `n` is `initial * multiplier^n`, capped at `max`, with
//! a symmetric jitter applied on top. Jitter never feeds into later attempts.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    /// Fraction of the delay used as +/- jitter, 0.0 disables it
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay to wait before the next reconnect. The first call returns `initial`.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.base_delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        if self.config.jitter <= 0.0 {
            return base;
        }

        let spread = base.as_secs_f64() * self.config.jitter;
        let offset = rand::rng().random_range(-spread..=spread);
        let max = self.config.max.as_secs_f64();
        Duration::from_secs_f64((base.as_secs_f64() + offset).clamp(0.001, max))
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let scaled = self.config.initial.as_secs_f64() * self.config.multiplier.powi(exponent);
        let capped = scaled.min(self.config.max.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.001))
    }

    /// Start over after a successful subscription
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of delays handed out since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(initial_ms: u64, max_ms: u64, multiplier: f64) -> ExponentialBackoff {
        ExponentialBackoff::with_config(BackoffConfig {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(max_ms),
            multiplier,
            jitter: 0.0,
        })
    }

    #[test]
    fn test_delays_double() {
        let mut backoff = steady(100, 10_000, 2.0);

        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.attempt(), 3);
    }

    #[test]
    fn test_delay_is_capped() {
        let mut backoff = steady(1000, 5000, 10.0);

        for _ in 0..5 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), Duration::from_millis(5000));
    }

    #[test]
    fn test_many_attempts_do_not_overflow() {
        let mut backoff = steady(500, 30_000, 2.0);

        for _ in 0..2000 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), Duration::from_millis(30_000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let config = BackoffConfig {
            initial: Duration::from_millis(1000),
            ..BackoffConfig::default()
        };

        for _ in 0..50 {
            let mut backoff = ExponentialBackoff::with_config(config.clone());
            let first = backoff.next_delay().as_millis();
            assert!((900..=1100).contains(&first), "first delay {}", first);

            // Jitter on the first delay does not shift the second one's base
            let second = backoff.next_delay().as_millis();
            assert!((1800..=2200).contains(&second), "second delay {}", second);
        }
    }

    #[test]
    fn test_reset_starts_over() {
        let mut backoff = steady(100, 10_000, 2.0);

        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();

        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
