//! The display collaborator.
//!
//! [`FrameDisplay`] is everything the playback loop needs from a window:
//! show an image, wait a bounded (or unbounded) time for a key press, and
//! close. With the `window` feature enabled, [`HighGuiWindow`] implements it
//! with an OpenCV HighGUI window.

use std::time::Duration;

use image::DynamicImage;

use crate::error::PlayerError;

/// A surface that shows frames and reports key presses.
pub trait FrameDisplay {
    /// Replace the displayed image.
    fn show(&mut self, image: &DynamicImage) -> Result<(), PlayerError>;

    /// Wait for a key press.
    ///
    /// With `Some(timeout)` the call returns `Ok(None)` once the timeout
    /// expires without input. With `None` it blocks until a key arrives.
    fn poll_key(&mut self, timeout: Option<Duration>) -> Result<Option<i32>, PlayerError>;

    /// Close the display. Calling it more than once is harmless.
    fn close(&mut self);
}

#[cfg(feature = "window")]
pub use highgui_window::HighGuiWindow;

#[cfg(feature = "window")]
mod highgui_window {
    use std::time::Duration;

    use image::DynamicImage;
    use opencv::{
        core::{CV_8UC1, CV_8UC3, CV_8UC4, Mat, Scalar},
        highgui,
        prelude::*,
    };

    use super::FrameDisplay;
    use crate::error::PlayerError;

    fn display_error(error: opencv::Error) -> PlayerError {
        PlayerError::Display(error.to_string())
    }

    /// An OpenCV HighGUI window.
    ///
    /// The window is created by [`new`](HighGuiWindow::new) and destroyed by
    /// [`close`](FrameDisplay::close) or on drop.
    #[derive(Debug)]
    pub struct HighGuiWindow {
        title: String,
        open: bool,
    }

    impl HighGuiWindow {
        /// Create a resizable window named `title`.
        pub fn new<T: Into<String>>(title: T) -> Result<Self, PlayerError> {
            let title = title.into();
            highgui::named_window(&title, highgui::WINDOW_NORMAL).map_err(display_error)?;
            Ok(Self { title, open: true })
        }
    }

    impl FrameDisplay for HighGuiWindow {
        fn show(&mut self, image: &DynamicImage) -> Result<(), PlayerError> {
            let mat = image_to_mat(image)?;
            highgui::imshow(&self.title, &mat).map_err(display_error)
        }

        fn poll_key(&mut self, timeout: Option<Duration>) -> Result<Option<i32>, PlayerError> {
            // HighGUI treats a zero delay as "wait forever".
            let delay = match timeout {
                Some(timeout) => timeout.as_millis().clamp(1, i32::MAX as u128) as i32,
                None => 0,
            };
            let key = highgui::wait_key(delay).map_err(display_error)?;
            Ok((key >= 0).then_some(key))
        }

        fn close(&mut self) {
            if self.open {
                self.open = false;
                if let Err(error) = highgui::destroy_all_windows() {
                    log::warn!("Failed to close display window: {error}");
                }
            }
        }
    }

    impl Drop for HighGuiWindow {
        fn drop(&mut self) {
            self.close();
        }
    }

    /// Copy an image into a new `Mat` in the BGR(A) channel order HighGUI
    /// expects.
    fn image_to_mat(image: &DynamicImage) -> Result<Mat, PlayerError> {
        let converted;
        let (mat_type, channels, pixels) = match image {
            DynamicImage::ImageLuma8(gray) => (CV_8UC1, 1, gray.as_raw().as_slice()),
            DynamicImage::ImageRgb8(rgb) => (CV_8UC3, 3, rgb.as_raw().as_slice()),
            DynamicImage::ImageRgba8(rgba) => (CV_8UC4, 4, rgba.as_raw().as_slice()),
            other => {
                converted = other.to_rgb8();
                (CV_8UC3, 3, converted.as_raw().as_slice())
            }
        };

        let mut mat = Mat::new_rows_cols_with_default(
            image.height() as i32,
            image.width() as i32,
            mat_type,
            Scalar::all(0.0),
        )
        .map_err(display_error)?;
        copy_to_bgr(pixels, mat.data_bytes_mut().map_err(display_error)?, channels);
        Ok(mat)
    }

    /// Copy packed pixels, swapping red and blue when there are colour channels.
    fn copy_to_bgr(source: &[u8], target: &mut [u8], channels: usize) {
        if channels < 3 {
            target.copy_from_slice(source);
            return;
        }
        for (from, to) in source
            .chunks_exact(channels)
            .zip(target.chunks_exact_mut(channels))
        {
            to.copy_from_slice(from);
            to.swap(0, 2);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::copy_to_bgr;

        #[test]
        fn red_and_blue_are_swapped() {
            let rgb = [1, 2, 3, 4, 5, 6];
            let mut bgr = [0; 6];
            copy_to_bgr(&rgb, &mut bgr, 3);
            assert_eq!(bgr, [3, 2, 1, 6, 5, 4]);

            let rgba = [1, 2, 3, 255];
            let mut bgra = [0; 4];
            copy_to_bgr(&rgba, &mut bgra, 4);
            assert_eq!(bgra, [3, 2, 1, 255]);
        }

        #[test]
        fn gray_is_copied_unchanged() {
            let gray = [7, 8, 9];
            let mut target = [0; 3];
            copy_to_bgr(&gray, &mut target, 1);
            assert_eq!(target, gray);
        }
    }
}
