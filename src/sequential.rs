//! Sequential decoding for continuous playback.

use crate::{
    decoder::{DecodedFrame, FrameDecoder},
    error::PlayerError,
    source::VideoSource,
};

impl<S: VideoSource> FrameDecoder<S> {
    /// Decode the next frame in stream order, continuing from wherever the
    /// last seek or decode left the decoder.
    ///
    /// Returns `Ok(None)` at end of stream. The watermark is updated to the
    /// returned frame's timestamp.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framestep::{FfmpegSource, FrameDecoder};
    ///
    /// let mut decoder = FrameDecoder::new(FfmpegSource::open("input.avi")?);
    /// let mut count = 0;
    /// while let Some(_frame) = decoder.decode_next()? {
    ///     count += 1;
    /// }
    /// println!("{count} frames");
    /// # Ok::<(), framestep::PlayerError>(())
    /// ```
    pub fn decode_next(&mut self) -> Result<Option<DecodedFrame>, PlayerError> {
        let Some(frame) = self.next_raw_frame()? else {
            return Ok(None);
        };

        let (timestamp, synthesized) = self.resolve_timestamp(&frame);
        self.last_shown_timestamp = Some(timestamp);
        Ok(Some(DecodedFrame::new(frame, timestamp, synthesized)))
    }
}
