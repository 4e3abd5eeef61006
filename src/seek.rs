//! Frame-exact random access.
//!
//! Demuxers can only seek to keyframes, which rarely coincide with the frame
//! the caller asked for. [`FrameDecoder::seek_to_frame`] seeks backward to the
//! nearest keyframe at or before the target, flushes the decoder, and decodes
//! forward until the first frame whose timestamp reaches the target. The frame
//! returned is the earliest one at or after the requested position.

use crate::{
    decoder::{DecodedFrame, FrameDecoder},
    error::PlayerError,
    source::VideoSource,
};

impl<S: VideoSource> FrameDecoder<S> {
    /// Position the decoder on `frame_number` and return that frame together
    /// with its resolved ordinal.
    ///
    /// The watermark is updated to the returned frame's timestamp.
    ///
    /// # Errors
    ///
    /// - [`PlayerError::SeekFailed`] if the demuxer rejects the seek.
    /// - [`PlayerError::DecodeExhausted`] if the stream ends before a frame at
    ///   or after the target is decoded.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framestep::{FfmpegSource, FrameDecoder};
    ///
    /// let mut decoder = FrameDecoder::new(FfmpegSource::open("input.avi")?);
    /// let (frame, frame_number) = decoder.seek_to_frame(120)?;
    /// assert!(frame_number >= 120);
    /// println!("{}x{} at {}", frame.width(), frame.height(), frame.timestamp());
    /// # Ok::<(), framestep::PlayerError>(())
    /// ```
    pub fn seek_to_frame(&mut self, frame_number: u64) -> Result<(DecodedFrame, u64), PlayerError> {
        let target_timestamp = self.time_mapper.frame_to_timestamp(frame_number);
        log::debug!("Seeking to frame {frame_number} (timestamp {target_timestamp})");

        self.source
            .seek(target_timestamp)
            .map_err(|error| PlayerError::SeekFailed {
                frame_number,
                timestamp: target_timestamp,
                reason: error.to_string(),
            })?;

        self.source.flush();
        self.eof_sent = false;

        let mut skipped = 0_u64;
        while let Some(frame) = self.next_raw_frame()? {
            let (timestamp, synthesized) = self.resolve_timestamp(&frame);
            if timestamp < target_timestamp {
                skipped += 1;
                continue;
            }

            self.last_shown_timestamp = Some(timestamp);
            let resolved = self.time_mapper.timestamp_to_frame(timestamp);
            log::debug!(
                "Reached frame {resolved} (timestamp {timestamp}) after decoding {skipped} preceding frames"
            );
            return Ok((DecodedFrame::new(frame, timestamp, synthesized), resolved));
        }

        Err(PlayerError::DecodeExhausted { frame_number })
    }
}
