//! The video-decoding collaborator.
//!
//! [`VideoSource`] is the narrow interface the seek and sequential decoders
//! drive: a backward-biased coarse seek, a decoder flush, and the
//! read / send / receive packet loop. [`FfmpegSource`] implements it on top of
//! an FFmpeg demuxer and decoder for the first video stream of a container.
//!
//! Keeping the seam a trait lets the frame-positioning logic run against any
//! packet source, including scripted ones in tests.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    os::raw::c_int,
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder, format::context::Input, frame::Video as VideoFrame,
    media::Type, util::error::EAGAIN,
};

use crate::{error::PlayerError, metadata::StreamDescriptor, timing};

/// Outcome of asking the decoder for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A frame was written into the output buffer.
    Frame,
    /// The decoder needs another compressed unit first.
    NeedsInput,
    /// The decoder is fully drained after end of input.
    EndOfStream,
    /// The decoder failed on the last unit; decoding may continue with the
    /// next one.
    Corrupt(String),
}

/// A demuxer + decoder pair for a single video stream.
///
/// All methods are called from the playback loop only; implementations need
/// no internal synchronization.
pub trait VideoSource {
    /// The immutable description of the video stream.
    fn descriptor(&self) -> &StreamDescriptor;

    /// Seek the demuxer to the keyframe at or before `timestamp` (in the
    /// video stream's time base).
    fn seek(&mut self, timestamp: i64) -> Result<(), PlayerError>;

    /// Discard every frame and packet buffered inside the decoder, including
    /// any end-of-input state.
    fn flush(&mut self);

    /// Read the next compressed unit from the container, for any stream.
    ///
    /// Returns `None` once the container is exhausted.
    fn read_packet(&mut self) -> Option<Packet>;

    /// Feed one compressed unit of the video stream to the decoder.
    fn send_packet(&mut self, packet: &Packet) -> Result<(), PlayerError>;

    /// Tell the decoder that no more input follows, so it releases the frames
    /// it is still holding back.
    fn send_eof(&mut self) -> Result<(), PlayerError>;

    /// Pull the next decoded frame into `frame`.
    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Received;
}

/// FFmpeg-backed [`VideoSource`] for the first video stream of a file.
///
/// The demuxer and decoder contexts are released when the value is dropped.
pub struct FfmpegSource {
    input_context: Input,
    decoder: VideoDecoder,
    descriptor: StreamDescriptor,
    file_path: PathBuf,
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("descriptor", &self.descriptor)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open a container and prepare a decoder for its first video stream.
    ///
    /// # Errors
    ///
    /// - [`PlayerError::FileOpen`] if the file cannot be read.
    /// - [`PlayerError::StreamProbe`] if FFmpeg cannot recognise the
    ///   container or read its stream information.
    /// - [`PlayerError::NoVideoStream`] if no stream carries video.
    /// - [`PlayerError::DecoderUnavailable`] if no decoder can be opened for
    ///   the codec.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PlayerError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        std::fs::File::open(path).map_err(|error| PlayerError::FileOpen {
            path: file_path.clone(),
            reason: error.to_string(),
        })?;

        ffmpeg_next::init().map_err(|error| PlayerError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        // Opens the container and reads its stream information.
        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| PlayerError::StreamProbe {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let container_duration = input_context.duration();
        let duration = if container_duration > 0 {
            Duration::from_micros(container_duration as u64)
        } else {
            Duration::ZERO
        };

        let (decoder, descriptor) = {
            let stream = input_context
                .streams()
                .find(|stream| stream.parameters().medium() == Type::Video)
                .ok_or(PlayerError::NoVideoStream)?;

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| PlayerError::DecoderUnavailable(error.to_string()))?;
            let decoder = decoder_context.decoder().video().map_err(|error| {
                PlayerError::DecoderUnavailable(format!(
                    "stream {} has no usable decoder: {error}",
                    stream.index()
                ))
            })?;

            let frame_rate = timing::nominal_frame_rate(stream.avg_frame_rate(), stream.rate());
            let codec = decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            let descriptor = StreamDescriptor {
                stream_index: stream.index(),
                time_base: stream.time_base(),
                frame_rate,
                width: decoder.width(),
                height: decoder.height(),
                codec,
                duration,
                frame_count: StreamDescriptor::estimate_frame_count(
                    stream.frames(),
                    duration,
                    frame_rate,
                ),
            };
            (decoder, descriptor)
        };

        log::info!(
            "Opened {} (stream={}, {}x{}, {:.3} fps, codec={}, ~{} frames)",
            file_path.display(),
            descriptor.stream_index,
            descriptor.width,
            descriptor.height,
            descriptor.frames_per_second(),
            descriptor.codec,
            descriptor.frame_count,
        );

        Ok(Self {
            input_context,
            decoder,
            descriptor,
            file_path,
        })
    }

    /// Path the source was opened from.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl VideoSource for FfmpegSource {
    fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn seek(&mut self, timestamp: i64) -> Result<(), PlayerError> {
        // `Input::seek` only exposes the AV_TIME_BASE variant, so seek on the
        // video stream directly to stay in its own time base.
        let result = unsafe {
            ffmpeg_sys_next::av_seek_frame(
                self.input_context.as_mut_ptr(),
                self.descriptor.stream_index as c_int,
                timestamp,
                ffmpeg_sys_next::AVSEEK_FLAG_BACKWARD as c_int,
            )
        };

        if result < 0 {
            return Err(PlayerError::from(FfmpegError::from(result)));
        }
        Ok(())
    }

    fn flush(&mut self) {
        self.decoder.flush();
    }

    fn read_packet(&mut self) -> Option<Packet> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input_context) {
            Ok(()) => Some(packet),
            Err(FfmpegError::Eof) => None,
            Err(error) => {
                log::warn!("Demuxer read failed, treating as end of input: {error}");
                None
            }
        }
    }

    fn send_packet(&mut self, packet: &Packet) -> Result<(), PlayerError> {
        self.decoder
            .send_packet(packet)
            .map_err(|error| PlayerError::VideoDecodeError(error.to_string()))
    }

    fn send_eof(&mut self) -> Result<(), PlayerError> {
        self.decoder
            .send_eof()
            .map_err(|error| PlayerError::VideoDecodeError(error.to_string()))
    }

    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Received {
        match self.decoder.receive_frame(frame) {
            Ok(()) => Received::Frame,
            Err(FfmpegError::Other { errno }) if errno == EAGAIN => Received::NeedsInput,
            Err(FfmpegError::Eof) => Received::EndOfStream,
            Err(error) => Received::Corrupt(error.to_string()),
        }
    }
}
