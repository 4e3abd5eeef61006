//! Per-session decode state.
//!
//! [`FrameDecoder`] owns the [`VideoSource`] together with the "last shown"
//! timestamp watermark. Both the random-access path
//! ([`seek_to_frame`](FrameDecoder::seek_to_frame)) and the playback path
//! ([`decode_next`](FrameDecoder::decode_next)) run through it, so the two can
//! never be in flight at the same time and always agree on the watermark.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};

use crate::{
    error::PlayerError,
    metadata::StreamDescriptor,
    source::{Received, VideoSource},
    timing::TimeMapper,
};

/// A decoded frame together with its resolved presentation timestamp.
///
/// The frame is exclusively owned; it is handed to the
/// [`PixelConverter`](crate::PixelConverter) by reference and dropped by the
/// caller afterwards.
pub struct DecodedFrame {
    frame: VideoFrame,
    timestamp: i64,
    synthesized: bool,
}

impl Debug for DecodedFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format())
            .field("timestamp", &self.timestamp)
            .field("synthesized", &self.synthesized)
            .finish()
    }
}

impl DecodedFrame {
    pub fn new(frame: VideoFrame, timestamp: i64, synthesized: bool) -> Self {
        Self {
            frame,
            timestamp,
            synthesized,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Pixel format the decoder produced.
    pub fn format(&self) -> Pixel {
        self.frame.format()
    }

    /// Presentation timestamp in the stream's time base.
    ///
    /// Taken from the decoder's best-effort timestamp, falling back to the
    /// frame PTS, or synthesized when neither is known.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns `true` if the decoder supplied no timestamp and
    /// [`timestamp`](DecodedFrame::timestamp) was derived from the watermark.
    ///
    /// Synthesized timestamps assume gapless constant-rate timing and drift on
    /// variable-frame-rate content.
    pub fn is_timestamp_synthesized(&self) -> bool {
        self.synthesized
    }

    /// The underlying FFmpeg frame.
    pub fn video_frame(&self) -> &VideoFrame {
        &self.frame
    }

    /// Consume the wrapper and return the FFmpeg frame.
    pub fn into_video_frame(self) -> VideoFrame {
        self.frame
    }
}

/// Decoder state shared by seeking and sequential playback.
pub struct FrameDecoder<S: VideoSource> {
    pub(crate) source: S,
    pub(crate) time_mapper: TimeMapper,
    stream_index: usize,
    pub(crate) last_shown_timestamp: Option<i64>,
    /// End of input has been signalled to the decoder; only buffered frames
    /// remain. Cleared by a flush.
    pub(crate) eof_sent: bool,
}

impl<S: VideoSource + Debug> Debug for FrameDecoder<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameDecoder")
            .field("source", &self.source)
            .field("time_mapper", &self.time_mapper)
            .field("last_shown_timestamp", &self.last_shown_timestamp)
            .field("eof_sent", &self.eof_sent)
            .finish()
    }
}

impl<S: VideoSource> FrameDecoder<S> {
    /// Wrap a freshly opened source. No frame has been shown yet.
    pub fn new(source: S) -> Self {
        let descriptor = source.descriptor();
        let time_mapper = descriptor.time_mapper();
        let stream_index = descriptor.stream_index;
        Self {
            source,
            time_mapper,
            stream_index,
            last_shown_timestamp: None,
            eof_sent: false,
        }
    }

    /// The stream being decoded.
    pub fn descriptor(&self) -> &StreamDescriptor {
        self.source.descriptor()
    }

    /// Ordinal ↔ timestamp mapper for the stream.
    pub fn time_mapper(&self) -> TimeMapper {
        self.time_mapper
    }

    /// Timestamp of the most recently returned frame, if any.
    pub fn last_shown_timestamp(&self) -> Option<i64> {
        self.last_shown_timestamp
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Release the decode state and return the source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Pull the next frame out of the decoder in decode order, feeding it
    /// video packets as needed.
    ///
    /// Packets of other streams are discarded. Rejected packets and corrupt
    /// output are logged and skipped. At end of input the decoder is drained
    /// before `None` is returned.
    pub(crate) fn next_raw_frame(&mut self) -> Result<Option<VideoFrame>, PlayerError> {
        let mut frame = VideoFrame::empty();

        loop {
            match self.source.receive_frame(&mut frame) {
                Received::Frame => return Ok(Some(frame)),
                Received::EndOfStream => return Ok(None),
                Received::NeedsInput => {}
                Received::Corrupt(reason) => {
                    log::warn!("Skipping undecodable video unit: {reason}");
                    if self.eof_sent {
                        continue;
                    }
                }
            }

            if self.eof_sent {
                return Ok(None);
            }

            match self.source.read_packet() {
                Some(packet) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    if let Err(error) = self.source.send_packet(&packet) {
                        log::warn!("Decoder rejected packet: {error}");
                    }
                }
                None => {
                    log::debug!("End of input reached, draining decoder");
                    self.source.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    /// Resolve the presentation timestamp of a decoded frame.
    ///
    /// Returns the timestamp and whether it had to be synthesized as
    /// `watermark + 1` (with an empty watermark counting as `-1`).
    pub(crate) fn resolve_timestamp(&self, frame: &VideoFrame) -> (i64, bool) {
        match frame.timestamp().or_else(|| frame.pts()) {
            Some(timestamp) => (timestamp, false),
            None => {
                let synthesized = self.last_shown_timestamp.unwrap_or(-1).saturating_add(1);
                log::debug!("Frame has no timestamp, synthesizing {synthesized}");
                (synthesized, true)
            }
        }
    }
}
