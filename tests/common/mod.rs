//! Scripted collaborators shared by the integration tests.
//!
//! [`ScriptedSource`] behaves like a demuxer + decoder pair over an in-memory
//! list of compressed units: seeks land on the last keyframe at or before the
//! requested timestamp, the decoder can hold frames back to mimic B-frame
//! reordering, and units can carry frames without timestamps or fail to
//! decode. Every call is counted so tests can check what the player did.

#![allow(dead_code)]

use std::{collections::VecDeque, time::Duration};

use ffmpeg_next::{Packet, Rational, format::Pixel, frame::Video as VideoFrame};
use framestep::{
    FrameDisplay, PlayerError, Received, StreamDescriptor, VideoSource, timing::frame_to_timestamp,
};
use image::DynamicImage;

pub const VIDEO_STREAM: usize = 0;
pub const AUDIO_STREAM: usize = 1;
pub const FRAME_WIDTH: u32 = 16;
pub const FRAME_HEIGHT: u32 = 16;

/// What a unit yields once sent to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// A frame with the given timestamp (`None` = unknown).
    Frame(Option<i64>),
    /// A decode failure for this unit.
    Corrupt,
}

#[derive(Debug, Clone)]
pub struct ScriptedUnit {
    pub stream: usize,
    pub keyframe: bool,
    pub outputs: Vec<Output>,
    pub size: (u32, u32),
    /// `send_packet` refuses this unit.
    pub rejected: bool,
}

impl ScriptedUnit {
    pub fn video(timestamp: Option<i64>, keyframe: bool) -> Self {
        Self {
            stream: VIDEO_STREAM,
            keyframe,
            outputs: vec![Output::Frame(timestamp)],
            size: (FRAME_WIDTH, FRAME_HEIGHT),
            rejected: false,
        }
    }

    pub fn audio() -> Self {
        Self {
            stream: AUDIO_STREAM,
            keyframe: true,
            outputs: Vec::new(),
            size: (0, 0),
            rejected: false,
        }
    }

    fn first_timestamp(&self) -> Option<i64> {
        self.outputs.iter().find_map(|output| match output {
            Output::Frame(timestamp) => *timestamp,
            Output::Corrupt => None,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallCounts {
    pub seeks: usize,
    pub flushes: usize,
    pub reads: usize,
    pub sends: usize,
    pub eofs: usize,
    pub receives: usize,
}

impl CallCounts {
    pub fn decode_calls(&self) -> usize {
        self.seeks + self.flushes + self.reads + self.sends + self.eofs + self.receives
    }
}

#[derive(Debug)]
pub struct ScriptedSource {
    descriptor: StreamDescriptor,
    units: Vec<ScriptedUnit>,
    position: usize,
    pending: VecDeque<(Output, (u32, u32))>,
    eof: bool,
    /// Frames the decoder holds back until more input or end of input.
    pub reorder_delay: usize,
    pub fail_seeks: bool,
    /// Seeks fail once this many have succeeded.
    pub fail_seeks_after: Option<usize>,
    pub calls: CallCounts,
    pub seek_targets: Vec<i64>,
}

pub fn descriptor(time_base: Rational, frame_rate: Rational, frame_count: u64) -> StreamDescriptor {
    StreamDescriptor {
        stream_index: VIDEO_STREAM,
        time_base,
        frame_rate,
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        codec: "scripted".to_string(),
        duration: Duration::from_secs_f64(frame_count as f64 / f64::from(frame_rate)),
        frame_count,
    }
}

impl ScriptedSource {
    pub fn new(descriptor: StreamDescriptor, units: Vec<ScriptedUnit>) -> Self {
        Self {
            descriptor,
            units,
            position: 0,
            pending: VecDeque::new(),
            eof: false,
            reorder_delay: 0,
            fail_seeks: false,
            fail_seeks_after: None,
            calls: CallCounts::default(),
            seek_targets: Vec::new(),
        }
    }

    /// A constant-rate stream with a keyframe every `gop` frames.
    pub fn constant_rate(
        frame_count: u64,
        gop: u64,
        frame_rate: Rational,
        time_base: Rational,
    ) -> Self {
        let units = (0..frame_count)
            .map(|index| {
                let timestamp = frame_to_timestamp(index, frame_rate, time_base);
                ScriptedUnit::video(Some(timestamp), index % gop == 0)
            })
            .collect();
        Self::new(descriptor(time_base, frame_rate, frame_count), units)
    }

    /// Ten seconds at 25 fps in a 1/12800 time base, keyframe every 12 frames.
    pub fn ten_seconds() -> Self {
        Self::constant_rate(250, 12, Rational::new(25, 1), Rational::new(1, 12_800))
    }

    /// Insert an audio unit after every video unit.
    pub fn with_audio_interleaved(mut self) -> Self {
        self.units = self
            .units
            .into_iter()
            .flat_map(|unit| [unit, ScriptedUnit::audio()])
            .collect();
        self
    }

    pub fn with_reorder_delay(mut self, delay: usize) -> Self {
        self.reorder_delay = delay;
        self
    }

    pub fn units_mut(&mut self) -> &mut Vec<ScriptedUnit> {
        &mut self.units
    }

    fn make_frame(timestamp: Option<i64>, size: (u32, u32)) -> VideoFrame {
        let mut frame = VideoFrame::new(Pixel::YUV420P, size.0, size.1);
        for plane in 0..frame.planes() {
            frame.data_mut(plane).fill(128);
        }
        frame.set_pts(timestamp);
        frame
    }
}

impl VideoSource for ScriptedSource {
    fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    fn seek(&mut self, timestamp: i64) -> Result<(), PlayerError> {
        self.calls.seeks += 1;
        self.seek_targets.push(timestamp);
        let exhausted = self
            .fail_seeks_after
            .is_some_and(|allowed| self.calls.seeks > allowed);
        if self.fail_seeks || exhausted {
            return Err(PlayerError::FfmpegError("Operation not permitted".to_string()));
        }

        self.position = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.stream == VIDEO_STREAM && unit.keyframe)
            .filter(|(_, unit)| unit.first_timestamp().is_some_and(|first| first <= timestamp))
            .map(|(index, _)| index)
            .last()
            .unwrap_or(0);
        Ok(())
    }

    fn flush(&mut self) {
        self.calls.flushes += 1;
        self.pending.clear();
        self.eof = false;
    }

    fn read_packet(&mut self) -> Option<Packet> {
        self.calls.reads += 1;
        let unit = self.units.get(self.position)?;
        let mut packet = Packet::copy(&(self.position as u32).to_le_bytes());
        packet.set_stream(unit.stream);
        self.position += 1;
        Some(packet)
    }

    fn send_packet(&mut self, packet: &Packet) -> Result<(), PlayerError> {
        self.calls.sends += 1;
        if self.eof {
            return Err(PlayerError::VideoDecodeError("decoder already drained".to_string()));
        }
        let data = packet.data().unwrap_or_default();
        let index = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let unit = &self.units[index];
        assert_eq!(unit.stream, VIDEO_STREAM, "non-video unit sent to decoder");
        if unit.rejected {
            return Err(PlayerError::VideoDecodeError("Invalid data found".to_string()));
        }
        for output in &unit.outputs {
            self.pending.push_back((*output, unit.size));
        }
        Ok(())
    }

    fn send_eof(&mut self) -> Result<(), PlayerError> {
        self.calls.eofs += 1;
        self.eof = true;
        Ok(())
    }

    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Received {
        self.calls.receives += 1;
        let releasable = self.pending.len() > self.reorder_delay || self.eof;
        match (releasable, self.pending.pop_front()) {
            (true, Some((Output::Frame(timestamp), size))) => {
                *frame = Self::make_frame(timestamp, size);
                Received::Frame
            }
            (true, Some((Output::Corrupt, _))) => Received::Corrupt("Invalid data".to_string()),
            (false, Some(held)) => {
                self.pending.push_front(held);
                Received::NeedsInput
            }
            (_, None) if self.eof => Received::EndOfStream,
            (_, None) => Received::NeedsInput,
        }
    }
}

/// A display that records what it was asked to do and replays scripted keys.
///
/// `None` entries in the script are timeouts. When the script runs out the
/// display answers with `q` so a loop under test always terminates.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub keys: VecDeque<Option<i32>>,
    pub shown: Vec<(u32, u32)>,
    pub polls: Vec<Option<Duration>>,
    pub closes: usize,
}

impl RecordingDisplay {
    pub fn with_keys<I: IntoIterator<Item = Option<i32>>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl FrameDisplay for RecordingDisplay {
    fn show(&mut self, image: &DynamicImage) -> Result<(), PlayerError> {
        self.shown.push((image.width(), image.height()));
        Ok(())
    }

    fn poll_key(&mut self, timeout: Option<Duration>) -> Result<Option<i32>, PlayerError> {
        self.polls.push(timeout);
        Ok(self.keys.pop_front().unwrap_or(Some(i32::from(b'q'))))
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

pub fn key(character: char) -> Option<i32> {
    Some(character as i32)
}
