//! The playback state machine.
//!
//! [`PlaybackController`] owns one session: the frame decoder, the pixel
//! converter and the display. It reacts to two kinds of events:
//!
//! - **ticks**, which fire every [`tick_interval`](PlaybackController::tick_interval)
//!   while playing and advance playback by one decoded frame, and
//! - **commands** ([`Command`]), usually mapped from key presses, which
//!   toggle playback or step one frame in either direction with a
//!   frame-exact seek.
//!
//! [`run`](PlaybackController::run) drives both from a single loop whose only
//! suspension point is the display's key poll.
//!
//! ```no_run
//! # #[cfg(feature = "window")]
//! # fn main() -> Result<(), framestep::PlayerError> {
//! use framestep::{FfmpegSource, HighGuiWindow, PlaybackController, PlaybackOptions};
//!
//! let options = PlaybackOptions::new();
//! let source = FfmpegSource::open("input.avi")?;
//! let window = HighGuiWindow::new(options.window_title())?;
//! PlaybackController::new(source, window, options).run()
//! # }
//! # #[cfg(not(feature = "window"))]
//! # fn main() {}
//! ```

use std::{path::PathBuf, time::Duration};

use image::DynamicImage;

use crate::{
    configuration::PlaybackOptions,
    conversion::PixelConverter,
    decoder::{DecodedFrame, FrameDecoder},
    display::FrameDisplay,
    error::PlayerError,
    metadata::StreamDescriptor,
    source::VideoSource,
};

const KEY_ESCAPE: i32 = 27;
const KEY_LEFT_ARROW: i32 = 81;
const KEY_RIGHT_ARROW: i32 = 83;

/// Playback state. `Quit` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Paused,
    Playing,
    Quit,
}

/// A discrete user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePlayPause,
    StepForward,
    StepBackward,
    /// Force the playing state.
    Play,
    /// Force the paused state.
    Pause,
    Quit,
    /// Save the displayed image to the snapshot directory.
    Snapshot,
}

impl Command {
    /// Map a key code reported by the display to a command.
    ///
    /// Escape and the arrow key codes are matched on the full code; letters
    /// on its low byte.
    pub fn from_key(key: i32) -> Option<Self> {
        match key {
            KEY_ESCAPE => return Some(Command::Quit),
            KEY_RIGHT_ARROW => return Some(Command::StepForward),
            KEY_LEFT_ARROW => return Some(Command::StepBackward),
            _ => {}
        }

        match (key & 0xFF) as u8 {
            b' ' => Some(Command::TogglePlayPause),
            b'n' => Some(Command::StepForward),
            b'b' => Some(Command::StepBackward),
            b'q' => Some(Command::Quit),
            b's' => Some(Command::Play),
            b'p' => Some(Command::Pause),
            b'w' => Some(Command::Snapshot),
            _ => None,
        }
    }
}

/// One playback session over a [`VideoSource`] and a [`FrameDisplay`].
pub struct PlaybackController<S: VideoSource, D: FrameDisplay> {
    decoder: FrameDecoder<S>,
    converter: PixelConverter,
    display: D,
    options: PlaybackOptions,
    state: PlaybackState,
    current_frame: u64,
    tick_interval: Duration,
    last_image: Option<DynamicImage>,
}

impl<S: VideoSource, D: FrameDisplay> PlaybackController<S, D> {
    /// Create a paused session. Nothing is decoded until
    /// [`start`](PlaybackController::start) or [`run`](PlaybackController::run).
    pub fn new(source: S, display: D, options: PlaybackOptions) -> Self {
        let decoder = FrameDecoder::new(source);
        let tick_interval = decoder.time_mapper().tick_interval();
        let converter = PixelConverter::new(options.pixel_format);
        Self {
            decoder,
            converter,
            display,
            options,
            state: PlaybackState::Paused,
            current_frame: 0,
            tick_interval,
            last_image: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Ordinal of the frame currently on screen.
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Timestamp of the frame currently on screen, if one was shown.
    pub fn last_shown_timestamp(&self) -> Option<i64> {
        self.decoder.last_shown_timestamp()
    }

    /// Fixed delay between playback ticks.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        self.decoder.descriptor()
    }

    pub fn decoder(&self) -> &FrameDecoder<S> {
        &self.decoder
    }

    pub fn converter(&self) -> &PixelConverter {
        &self.converter
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Show the configured start frame and enter the initial state.
    ///
    /// # Errors
    ///
    /// Any failure to produce the first frame is fatal for the session,
    /// including [`PlayerError::DecodeExhausted`] for a start frame past the
    /// end of the stream.
    pub fn start(&mut self) -> Result<(), PlayerError> {
        let (frame, frame_number) = self.decoder.seek_to_frame(self.options.start_frame)?;
        self.present(&frame)?;
        self.current_frame = frame_number;
        self.state = if self.options.autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
        log::info!("Showing frame {frame_number}");
        Ok(())
    }

    /// Run the session until the user quits.
    ///
    /// The display is closed on every exit path.
    pub fn run(&mut self) -> Result<(), PlayerError> {
        let result = self.start().and_then(|()| self.event_loop());
        self.display.close();
        result
    }

    fn event_loop(&mut self) -> Result<(), PlayerError> {
        while self.state != PlaybackState::Quit {
            let timeout = (self.state == PlaybackState::Playing).then_some(self.tick_interval);
            match self.display.poll_key(timeout)? {
                None => self.tick()?,
                Some(key) => match Command::from_key(key) {
                    Some(command) => self.handle(command)?,
                    None => log::trace!("Ignoring key {key}"),
                },
            }
        }
        Ok(())
    }

    /// Advance playback by one frame. Does nothing unless playing.
    ///
    /// At end of stream the session pauses.
    pub fn tick(&mut self) -> Result<(), PlayerError> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }

        match self.decoder.decode_next()? {
            Some(frame) => {
                self.present(&frame)?;
                self.current_frame = self
                    .decoder
                    .time_mapper()
                    .timestamp_to_frame(frame.timestamp());
            }
            None => {
                log::info!("End of file reached");
                self.state = PlaybackState::Paused;
            }
        }
        Ok(())
    }

    /// Apply a command. After [`Command::Quit`] every command is ignored.
    ///
    /// Seek failures and end of stream while stepping are reported through
    /// the log and leave the current frame unchanged.
    pub fn handle(&mut self, command: Command) -> Result<(), PlayerError> {
        if self.state == PlaybackState::Quit {
            return Ok(());
        }

        match command {
            Command::TogglePlayPause => {
                let next = match self.state {
                    PlaybackState::Playing => PlaybackState::Paused,
                    _ => PlaybackState::Playing,
                };
                self.set_state(next);
            }
            Command::Play => self.set_state(PlaybackState::Playing),
            Command::Pause => self.set_state(PlaybackState::Paused),
            Command::StepForward => self.step_to(self.current_frame.saturating_add(1))?,
            Command::StepBackward => self.step_to(self.current_frame.saturating_sub(1))?,
            Command::Snapshot => match self.snapshot() {
                Ok(path) => log::info!("Saved snapshot {}", path.display()),
                Err(error) => log::warn!("Snapshot failed: {error}"),
            },
            Command::Quit => {
                log::debug!("Quitting at frame {}", self.current_frame);
                self.state = PlaybackState::Quit;
                self.display.close();
            }
        }
        Ok(())
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            log::info!("{}", if state == PlaybackState::Playing { "Play" } else { "Pause" });
        }
        self.state = state;
    }

    fn step_to(&mut self, target: u64) -> Result<(), PlayerError> {
        self.state = PlaybackState::Paused;

        match self.decoder.seek_to_frame(target) {
            Ok((frame, frame_number)) => {
                self.present(&frame)?;
                self.current_frame = frame_number;
            }
            Err(error) if error.is_end_of_stream() => {
                log::info!("Could not decode frame {target} (end of stream)");
            }
            Err(error @ PlayerError::SeekFailed { .. }) => log::warn!("{error}"),
            Err(error) => return Err(error),
        }
        Ok(())
    }

    fn present(&mut self, frame: &DecodedFrame) -> Result<(), PlayerError> {
        let image = self.converter.convert(frame)?;
        self.display.show(&image)?;
        self.last_image = Some(image);
        Ok(())
    }

    /// Write the displayed image to `<snapshot_dir>/frame_<ordinal>.png`.
    pub fn snapshot(&self) -> Result<PathBuf, PlayerError> {
        let image = self
            .last_image
            .as_ref()
            .ok_or(PlayerError::NothingToSnapshot)?;
        let path = self
            .options
            .snapshot_dir
            .join(format!("frame_{:06}.png", self.current_frame));
        image.save(&path)?;
        Ok(path)
    }
}
