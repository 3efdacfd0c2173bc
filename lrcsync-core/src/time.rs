//! Time and duration conversion utilities.
//!
//! Lyric timestamps are kept as [`Duration`]s end to end. This module provides
//! the saturating conversions and the exact proportional arithmetic the
//! segmenter and synthesizer rely on to tile an interval without rounding gaps.

use std::time::Duration;

const NANOS_PER_CENTI: u128 = 10_000_000;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to whole centiseconds, rounding to nearest and
    /// saturating at `u64::MAX`.
    fn as_centis_rounded(&self) -> u64;

    /// Round to the nearest centisecond, the resolution of the LRC formats.
    fn round_to_centis(&self) -> Duration;

    /// Absolute difference between two durations.
    fn distance(&self, other: Duration) -> Duration;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_centis_rounded(&self) -> u64 {
        let centis = (self.as_nanos() + NANOS_PER_CENTI / 2) / NANOS_PER_CENTI;
        u64::try_from(centis).unwrap_or(u64::MAX)
    }

    fn round_to_centis(&self) -> Duration {
        Duration::from_millis(self.as_centis_rounded().saturating_mul(10))
    }

    fn distance(&self, other: Duration) -> Duration {
        if *self > other {
            *self - other
        } else {
            other - *self
        }
    }
}

/// `duration * numerator / denominator`, computed in integer nanoseconds so
/// that `fraction(d, k, n) + fraction(d, n - k, n)` never drifts more than one
/// nanosecond from `d`. Returns `Duration::ZERO` when `denominator` is zero.
#[must_use]
pub fn fraction(duration: Duration, numerator: usize, denominator: usize) -> Duration {
    if denominator == 0 {
        return Duration::ZERO;
    }
    let (Ok(num), Ok(den)) = (u128::try_from(numerator), u128::try_from(denominator)) else {
        return Duration::ZERO;
    };
    let nanos = duration.as_nanos() * num / den;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Convert non-negative seconds to a duration. Negative, NaN and infinite
/// inputs yield `None`.
#[must_use]
pub fn secs_to_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_u64() {
        let duration = Duration::from_millis(1234);
        assert_eq!(duration.as_millis_u64(), 1234);
    }

    #[test]
    fn test_as_centis_rounded() {
        assert_eq!(Duration::from_millis(12_344).as_centis_rounded(), 1234);
        assert_eq!(Duration::from_millis(12_345).as_centis_rounded(), 1235);
        assert_eq!(Duration::ZERO.as_centis_rounded(), 0);
    }

    #[test]
    fn test_round_to_centis() {
        let d = Duration::from_nanos(10_333_333_333);
        assert_eq!(d.round_to_centis(), Duration::from_millis(10_330));
    }

    #[test]
    fn test_distance() {
        let a = Duration::from_secs(3);
        let b = Duration::from_secs(5);
        assert_eq!(a.distance(b), Duration::from_secs(2));
        assert_eq!(b.distance(a), Duration::from_secs(2));
    }

    #[test]
    fn test_fraction_exact_split() {
        let d = Duration::from_secs(4);
        assert_eq!(fraction(d, 3, 5), Duration::from_millis(2400));
        assert_eq!(fraction(d, 2, 5), Duration::from_millis(1600));
    }

    #[test]
    fn test_fraction_zero_denominator() {
        assert_eq!(fraction(Duration::from_secs(1), 1, 0), Duration::ZERO);
    }

    #[test]
    fn test_secs_to_duration_rejects_negative() {
        assert_eq!(secs_to_duration(-1.0), None);
        assert_eq!(secs_to_duration(f64::NAN), None);
        assert_eq!(secs_to_duration(1.5), Some(Duration::from_millis(1500)));
    }
}
