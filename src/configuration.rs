//! Playback configuration.
//!
//! [`PlaybackOptions`] is a builder carrying the settings of a playback
//! session: where to start, whether to start playing, the display pixel
//! layout, the window title, and where snapshots are written.
//!
//! # Example
//!
//! ```
//! use framestep::{PixelFormat, PlaybackOptions};
//!
//! let options = PlaybackOptions::new()
//!     .with_start_frame(250)
//!     .with_autoplay(true)
//!     .with_pixel_format(PixelFormat::Rgba8);
//! assert_eq!(options.start_frame(), 250);
//! ```

use std::{path::PathBuf, str::FromStr};

use ffmpeg_next::format::Pixel;

/// Pixel layout of the images handed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with alpha pre-set to 255 (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel of the packed output.
    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "rgb8" | "rgb" => Ok(PixelFormat::Rgb8),
            "rgba8" | "rgba" => Ok(PixelFormat::Rgba8),
            "gray8" | "gray" | "grey" => Ok(PixelFormat::Gray8),
            other => Err(format!("unsupported pixel format: {other} (rgb8|rgba8|gray8)")),
        }
    }
}

/// Settings for a playback session.
///
/// A default-constructed value starts paused on frame 0 with RGB8 output.
#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    pub(crate) start_frame: u64,
    pub(crate) autoplay: bool,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) window_title: String,
    pub(crate) snapshot_dir: PathBuf,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            start_frame: 0,
            autoplay: false,
            pixel_format: PixelFormat::Rgb8,
            window_title: "framestep (q to quit)".to_string(),
            snapshot_dir: PathBuf::from("."),
        }
    }

    /// Frame shown when the session starts.
    #[must_use]
    pub fn with_start_frame(mut self, frame_number: u64) -> Self {
        self.start_frame = frame_number;
        self
    }

    /// Start in the playing state instead of paused.
    #[must_use]
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Pixel layout of displayed images.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Title of the playback window.
    #[must_use]
    pub fn with_window_title<T: Into<String>>(mut self, title: T) -> Self {
        self.window_title = title.into();
        self
    }

    /// Directory snapshots are written to.
    #[must_use]
    pub fn with_snapshot_dir<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.snapshot_dir = directory.into();
        self
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub fn window_title(&self) -> &str {
        &self.window_title
    }

    pub fn snapshot_dir(&self) -> &std::path::Path {
        &self.snapshot_dir
    }
}
