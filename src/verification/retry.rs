//! Retry policy for verification requests, decoupled from the transport.

use crate::core::config::Config;

use rand::Rng;
use std::time::Duration;

/// Bounded retry budget with a jittered delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per candidate, including the first.
    pub max_attempts: u32,
    /// Min/max seconds slept between attempts.
    pub sleep_range: (f32, f32),
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, sleep_range: (f32, f32)) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            sleep_range,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_verification_attempts,
            config.sleep_between_requests,
        )
    }

    /// Returns a random delay within the configured range.
    pub fn delay(&self) -> Duration {
        let (min, max) = self.sleep_range;
        if max <= min {
            return Duration::from_secs_f32(min.max(0.0));
        }
        let secs = rand::thread_rng().gen_range(min..=max);
        Duration::from_secs_f32(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, (0.1, 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_attempts_floor_is_one() {
        assert_eq!(RetryPolicy::new(0, (0.0, 0.0)).max_attempts, 1);
        assert_eq!(RetryPolicy::new(4, (0.0, 0.0)).max_attempts, 4);
    }

    #[test]
    fn test_delay_stays_within_range() {
        let policy = RetryPolicy::new(3, (0.1, 0.5));
        for _ in 0..50 {
            let d = policy.delay().as_secs_f32();
            assert!((0.1..=0.5).contains(&d), "delay {} out of range", d);
        }
    }

    #[test]
    fn test_degenerate_range_is_constant() {
        let policy = RetryPolicy::new(3, (0.2, 0.2));
        assert_eq!(policy.delay(), Duration::from_secs_f32(0.2));
    }
}
