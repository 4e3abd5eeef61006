//! # framestep
//!
//! Frame-accurate video playback. Step to any frame of a video by its ordinal
//! number, play and pause, and be sure that the frame on screen is the frame
//! that was asked for, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! Demuxers only seek to keyframes. `framestep` seeks backward to the nearest
//! keyframe and decodes forward until the requested frame's timestamp is
//! reached, mapping between ordinals and the stream's native time base with
//! exact rational arithmetic.
//!
//! ## Quick Start
//!
//! ### Fetch an exact frame
//!
//! ```no_run
//! use framestep::{FfmpegSource, FrameDecoder, PixelConverter};
//!
//! let mut decoder = FrameDecoder::new(FfmpegSource::open("input.avi")?);
//! let (frame, frame_number) = decoder.seek_to_frame(100)?;
//!
//! let mut converter = PixelConverter::default();
//! converter.convert(&frame)?.save(format!("frame_{frame_number}.png"))?;
//! # Ok::<(), framestep::PlayerError>(())
//! ```
//!
//! ### Interactive playback
//!
//! With the `window` feature, [`PlaybackController::run`] opens an OpenCV
//! window and maps keys to commands: space toggles play/pause, `n` / right
//! arrow steps forward, `b` / left arrow steps backward, `s` plays, `p`
//! pauses, `w` saves a snapshot, and `q` / escape quits.
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `window` | [`HighGuiWindow`] display backed by OpenCV HighGUI |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system; the
//! `window` feature additionally needs OpenCV.

pub mod configuration;
pub mod controller;
pub mod conversion;
pub mod decoder;
pub mod display;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
mod seek;
mod sequential;
pub mod source;
pub mod timing;

pub use configuration::{PixelFormat, PlaybackOptions};
pub use controller::{Command, PlaybackController, PlaybackState};
pub use conversion::PixelConverter;
pub use decoder::{DecodedFrame, FrameDecoder};
#[cfg(feature = "window")]
pub use display::HighGuiWindow;
pub use display::FrameDisplay;
pub use error::PlayerError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::StreamDescriptor;
pub use source::{FfmpegSource, Received, VideoSource};
pub use timing::TimeMapper;
