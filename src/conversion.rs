//! Display-ready pixel conversion.
//!
//! [`PixelConverter`] turns decoded frames into [`image::DynamicImage`]
//! values. Building an FFmpeg scaling context is far more expensive than
//! running it, so the context is cached and rebuilt only when the source
//! width, height or pixel format changes.

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{configuration::PixelFormat, decoder::DecodedFrame, error::PlayerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalerKey {
    width: u32,
    height: u32,
    format: Pixel,
}

/// Converts decoded frames to a fixed output layout at source resolution.
pub struct PixelConverter {
    output_format: PixelFormat,
    scaler: Option<(ScalerKey, ScalingContext)>,
    rebuild_count: u64,
}

impl std::fmt::Debug for PixelConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelConverter")
            .field("output_format", &self.output_format)
            .field("cached", &self.scaler.as_ref().map(|(key, _)| key))
            .field("rebuild_count", &self.rebuild_count)
            .finish()
    }
}

impl Default for PixelConverter {
    fn default() -> Self {
        Self::new(PixelFormat::default())
    }
}

impl PixelConverter {
    /// Create a converter producing `output_format` images. No scaling
    /// context is built until the first frame arrives.
    pub fn new(output_format: PixelFormat) -> Self {
        Self {
            output_format,
            scaler: None,
            rebuild_count: 0,
        }
    }

    /// The layout produced by [`convert`](PixelConverter::convert).
    pub fn output_format(&self) -> PixelFormat {
        self.output_format
    }

    /// How many times a scaling context has been built.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Convert one decoded frame into a freshly allocated image with the same
    /// dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::ConversionError`] if no scaling context exists
    /// for the frame's pixel format.
    pub fn convert(&mut self, frame: &DecodedFrame) -> Result<DynamicImage, PlayerError> {
        let source = frame.video_frame();
        let key = ScalerKey {
            width: source.width(),
            height: source.height(),
            format: source.format(),
        };

        let output_format = self.output_format;
        let scaler = self.scaler_for(key)?;
        let mut converted = VideoFrame::empty();
        scaler.run(source, &mut converted)?;

        packed_image(&converted, key.width, key.height, output_format)
    }

    fn scaler_for(&mut self, key: ScalerKey) -> Result<&mut ScalingContext, PlayerError> {
        let cached = matches!(&self.scaler, Some((current, _)) if *current == key);
        if !cached {
            log::debug!(
                "Building pixel converter for {}x{} {:?} -> {:?}",
                key.width,
                key.height,
                key.format,
                self.output_format,
            );
            let context = ScalingContext::get(
                key.format,
                key.width,
                key.height,
                self.output_format.to_ffmpeg_pixel(),
                key.width,
                key.height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| {
                PlayerError::ConversionError(format!(
                    "cannot convert {:?} {}x{}: {error}",
                    key.format, key.width, key.height
                ))
            })?;
            self.scaler = Some((key, context));
            self.rebuild_count += 1;
        }

        self.scaler
            .as_mut()
            .map(|(_, context)| context)
            .ok_or_else(|| PlayerError::ConversionError("scaling context missing".to_string()))
    }
}

/// Wrap plane 0 of a converted packed frame in an owned image.
///
/// Rows are copied one at a time because FFmpeg may pad them past
/// `width * bytes_per_pixel`.
fn packed_image(
    frame: &VideoFrame,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<DynamicImage, PlayerError> {
    let row_length = width as usize * format.bytes_per_pixel();
    let buffer: Vec<u8> = frame
        .data(0)
        .chunks(frame.stride(0).max(row_length).max(1))
        .take(height as usize)
        .flat_map(|row| row.iter().take(row_length).copied())
        .collect();
    let malformed = || {
        PlayerError::ConversionError(format!(
            "converted {format:?} buffer does not match {width}x{height}"
        ))
    };

    let image = match format {
        PixelFormat::Rgb8 => {
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, buffer).ok_or_else(malformed)?)
        }
        PixelFormat::Rgba8 => {
            DynamicImage::ImageRgba8(RgbaImage::from_raw(width, height, buffer).ok_or_else(malformed)?)
        }
        PixelFormat::Gray8 => {
            DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, buffer).ok_or_else(malformed)?)
        }
    };
    Ok(image)
}
