//! Busy-wait delays
//!
//! These spin on [`Instant`] instead of sleeping, trading CPU for precision
//! on short intervals.

use std::time::{Duration, Instant};

pub fn delay_seconds(seconds: f64) {
    if let Some(duration) = interval(seconds) {
        spin_for(duration);
    }
}

/// `None` for non-positive or non-finite input; huge values saturate.
fn interval(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
}

pub fn delay_milliseconds(milliseconds: f64) {
    delay_seconds(milliseconds / 1_000.0);
}

pub fn delay_microseconds(microseconds: f64) {
    delay_seconds(microseconds / 1_000_000.0);
}

pub fn delay_nanoseconds(nanoseconds: f64) {
    delay_seconds(nanoseconds / 1_000_000_000.0);
}

/// Spin until `duration` has elapsed.
pub fn spin_for(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_waits_at_least_requested() {
        let start = Instant::now();
        delay_milliseconds(5.0);
        assert!(start.elapsed() >= Duration::from_millis(5));

        let start = Instant::now();
        delay_microseconds(1500.0);
        assert!(start.elapsed() >= Duration::from_micros(1500));

        let start = Instant::now();
        delay_nanoseconds(2_000_000.0);
        assert!(start.elapsed() >= Duration::from_millis(2));
    }

    #[test]
    fn test_non_positive_and_non_finite_return_immediately() {
        let start = Instant::now();
        delay_seconds(0.0);
        delay_seconds(-1.0);
        delay_seconds(f64::NAN);
        delay_seconds(f64::INFINITY);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_interval_saturates_instead_of_panicking() {
        assert_eq!(interval(1e20), Some(Duration::MAX));
        assert_eq!(interval(f64::MAX), Some(Duration::MAX));
        assert_eq!(interval(0.25), Some(Duration::from_millis(250)));
        assert_eq!(interval(-3.0), None);
    }
}
