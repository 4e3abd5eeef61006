//! Error types for the `framestep` crate.
//!
//! This module defines [`PlayerError`], the unified error type returned by all
//! fallible operations in the crate. Variants fall into three groups:
//!
//! - **startup failures** ([`is_startup_fatal`](PlayerError::is_startup_fatal))
//!   that abort a session before the first frame is shown,
//! - **non-fatal notices** such as [`SeekFailed`](PlayerError::SeekFailed) that
//!   leave the playback state untouched,
//! - **end of stream** ([`DecodeExhausted`](PlayerError::DecodeExhausted)),
//!   which is a normal terminal condition for forward iteration.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framestep` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    /// The container could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::FfmpegSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// Stream information could not be read from the container.
    #[error("Failed to probe streams in {path}: {reason}")]
    StreamProbe {
        /// Path of the probed container.
        path: PathBuf,
        /// Underlying reason the probe failed.
        reason: String,
    },

    /// The container does not hold a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// No decoder could be opened for the video stream.
    #[error("Video decoder unavailable: {0}")]
    DecoderUnavailable(String),

    /// The coarse seek primitive rejected the requested position.
    #[error("Seek to frame {frame_number} (timestamp {timestamp}) failed: {reason}")]
    SeekFailed {
        /// Frame ordinal that was requested.
        frame_number: u64,
        /// Native timestamp the seek was issued for.
        timestamp: i64,
        /// Underlying reason reported by the demuxer.
        reason: String,
    },

    /// The stream ended before a frame at or after the target was decoded.
    #[error("Stream exhausted before frame {frame_number} could be decoded")]
    DecodeExhausted {
        /// Frame ordinal that was requested.
        frame_number: u64,
    },

    /// A compressed unit could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The pixel-format conversion context could not be built.
    #[error("Pixel conversion error: {0}")]
    ConversionError(String),

    /// The display collaborator failed.
    #[error("Display error: {0}")]
    Display(String),

    /// A snapshot was requested before any frame was shown.
    #[error("No frame has been shown yet")]
    NothingToSnapshot,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while saving a snapshot.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl PlayerError {
    /// Returns `true` for failures that prevent a session from starting.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            PlayerError::FileOpen { .. }
                | PlayerError::StreamProbe { .. }
                | PlayerError::NoVideoStream
                | PlayerError::DecoderUnavailable(_)
                | PlayerError::ConversionError(_)
                | PlayerError::Display(_)
        )
    }

    /// Returns `true` if the error only signals the end of the stream.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PlayerError::DecodeExhausted { .. })
    }
}

impl From<FfmpegError> for PlayerError {
    fn from(error: FfmpegError) -> Self {
        PlayerError::FfmpegError(error.to_string())
    }
}
