//! Stream descriptor.
//!
//! [`StreamDescriptor`] captures everything the player needs to know about the
//! selected video stream. It is read once when the source is opened and never
//! changes for the lifetime of the session.

use std::time::Duration;

use ffmpeg_next::Rational;

use crate::timing::{self, TimeMapper};

/// Immutable description of the video stream being played.
///
/// # Example
///
/// ```no_run
/// use framestep::{FfmpegSource, VideoSource};
///
/// let source = FfmpegSource::open("input.mp4")?;
/// let descriptor = source.descriptor();
/// println!(
///     "{}x{} @ {:.3} fps, ~{} frames",
///     descriptor.width,
///     descriptor.height,
///     descriptor.frames_per_second(),
///     descriptor.frame_count,
/// );
/// # Ok::<(), framestep::PlayerError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct StreamDescriptor {
    /// Index of the video stream inside the container.
    pub stream_index: usize,
    /// Native time base of the stream (seconds per timestamp unit).
    pub time_base: Rational,
    /// Nominal frame rate, already sanitized (never zero).
    pub frame_rate: Rational,
    /// Coded frame width in pixels.
    pub width: u32,
    /// Coded frame height in pixels.
    pub height: u32,
    /// Codec name (e.g. `"h264"`, `"mjpeg"`, `"dvvideo"`).
    pub codec: String,
    /// Container duration, or zero when unknown.
    pub duration: Duration,
    /// Estimated frame count; zero when neither the container nor the
    /// duration provide one.
    pub frame_count: u64,
}

impl StreamDescriptor {
    /// Frame rate as a floating-point value, for display and tick timing.
    pub fn frames_per_second(&self) -> f64 {
        f64::from(self.frame_rate)
    }

    /// The ordinal ↔ timestamp mapper for this stream.
    pub fn time_mapper(&self) -> TimeMapper {
        TimeMapper::new(self.frame_rate, self.time_base)
    }

    /// Estimate a frame count from the container duration when the stream
    /// does not declare one.
    pub(crate) fn estimate_frame_count(declared: i64, duration: Duration, frame_rate: Rational) -> u64 {
        if declared > 0 {
            return declared as u64;
        }
        let rate = timing::sanitize_frame_rate(frame_rate);
        (duration.as_secs_f64() * f64::from(rate)) as u64
    }
}
