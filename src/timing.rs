//! Frame ordinal ↔ native timestamp mapping.
//!
//! Every frame position the player exposes is an ordinal (0, 1, 2, ...). The
//! demuxer and decoder speak in native timestamps expressed in the stream's
//! time base. The functions here convert between the two with exact integer
//! arithmetic, so repeated stepping never accumulates floating-point drift.
//!
//! ```
//! use ffmpeg_next::Rational;
//! use framestep::timing::{frame_to_timestamp, timestamp_to_frame};
//!
//! let frame_rate = Rational::new(25, 1);
//! let time_base = Rational::new(1, 12_800);
//!
//! assert_eq!(frame_to_timestamp(5, frame_rate, time_base), 2_560);
//! assert_eq!(timestamp_to_frame(2_560, frame_rate, time_base), 5);
//! ```
//!
//! Ordinals count from timestamp 0, not from the stream's start time. A
//! stream whose first frame carries a later timestamp (common in MPEG-TS)
//! starts at a non-zero ordinal, and requests for earlier ordinals resolve to
//! that first frame:
//!
//! ```
//! use ffmpeg_next::Rational;
//! use framestep::timing::timestamp_to_frame;
//!
//! // First frame at 1.4 s in a 90 kHz time base.
//! assert_eq!(timestamp_to_frame(126_000, Rational::new(25, 1), Rational::new(1, 90_000)), 35);
//! ```

use std::time::Duration;

use ffmpeg_next::Rational;

/// Frame rate used when a stream reports a zero or invalid rate.
pub const DEFAULT_FRAME_RATE: Rational = Rational(25, 1);

/// Returns `rate` if it is a usable frame rate, otherwise [`DEFAULT_FRAME_RATE`].
pub fn sanitize_frame_rate(rate: Rational) -> Rational {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        DEFAULT_FRAME_RATE
    } else {
        rate
    }
}

/// Pick the nominal frame rate of a stream.
///
/// The average frame rate wins when it has a non-zero numerator, the real
/// base frame rate is used otherwise, and [`DEFAULT_FRAME_RATE`] covers
/// streams that report neither.
pub fn nominal_frame_rate(average: Rational, real_base: Rational) -> Rational {
    let candidate = if average.numerator() != 0 {
        average
    } else {
        real_base
    };
    sanitize_frame_rate(candidate)
}

/// Rescale `value` from units of `from` to units of `to`.
///
/// Computes `value * from / to` in 128-bit integers and rounds half away from
/// zero, matching `av_rescale_q`. Saturates at the `i64` range and returns 0
/// when `to` is degenerate.
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    let numerator = value as i128 * from.numerator() as i128 * to.denominator() as i128;
    let denominator = from.denominator() as i128 * to.numerator() as i128;
    if denominator == 0 {
        return 0;
    }

    let (numerator, denominator) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };

    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };

    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Duration of one frame in seconds, as a rational.
fn frame_duration(frame_rate: Rational) -> Rational {
    let rate = sanitize_frame_rate(frame_rate);
    Rational(rate.denominator(), rate.numerator())
}

/// Convert a frame ordinal to a timestamp in `time_base` units.
pub fn frame_to_timestamp(frame_number: u64, frame_rate: Rational, time_base: Rational) -> i64 {
    let frame_time = frame_duration(frame_rate);
    let frame_number = i64::try_from(frame_number).unwrap_or(i64::MAX);
    rescale(frame_number, frame_time, time_base)
}

/// Convert a timestamp in `time_base` units to the nearest frame ordinal.
///
/// Timestamps before the stream origin map to frame 0.
pub fn timestamp_to_frame(timestamp: i64, frame_rate: Rational, time_base: Rational) -> u64 {
    let frame_time = frame_duration(frame_rate);
    rescale(timestamp, time_base, frame_time).max(0) as u64
}

/// Delay between frames during continuous playback.
///
/// `round(1000 / max(1, fps))` milliseconds, never less than one millisecond.
pub fn tick_interval(frame_rate: Rational) -> Duration {
    let frames_per_second = f64::from(sanitize_frame_rate(frame_rate)).max(1.0);
    let milliseconds = (1000.0 / frames_per_second).round().max(1.0);
    Duration::from_millis(milliseconds as u64)
}

/// A stream's frame rate and time base, bundled for repeated conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeMapper {
    frame_rate: Rational,
    time_base: Rational,
}

impl TimeMapper {
    /// Create a mapper. An invalid `frame_rate` is replaced by
    /// [`DEFAULT_FRAME_RATE`].
    pub fn new(frame_rate: Rational, time_base: Rational) -> Self {
        Self {
            frame_rate: sanitize_frame_rate(frame_rate),
            time_base,
        }
    }

    /// The frame rate conversions are computed with.
    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    /// The native time base of the stream.
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /// See [`frame_to_timestamp`].
    pub fn frame_to_timestamp(&self, frame_number: u64) -> i64 {
        frame_to_timestamp(frame_number, self.frame_rate, self.time_base)
    }

    /// See [`timestamp_to_frame`].
    pub fn timestamp_to_frame(&self, timestamp: i64) -> u64 {
        timestamp_to_frame(timestamp, self.frame_rate, self.time_base)
    }

    /// See [`tick_interval`].
    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_rounds_half_away_from_zero() {
        assert_eq!(rescale(1, Rational(1, 2), Rational(1, 1)), 1);
        assert_eq!(rescale(-1, Rational(1, 2), Rational(1, 1)), -1);
        assert_eq!(rescale(1, Rational(1, 3), Rational(1, 1)), 0);
    }

    #[test]
    fn rescale_with_degenerate_target_is_zero() {
        assert_eq!(rescale(42, Rational(1, 25), Rational(0, 1)), 0);
    }

    #[test]
    fn nominal_rate_prefers_average() {
        let rate = nominal_frame_rate(Rational(30_000, 1_001), Rational(60, 1));
        assert_eq!(rate, Rational(30_000, 1_001));
        assert_eq!(nominal_frame_rate(Rational(0, 1), Rational(24, 1)), Rational(24, 1));
        assert_eq!(nominal_frame_rate(Rational(0, 0), Rational(0, 0)), DEFAULT_FRAME_RATE);
    }
}
