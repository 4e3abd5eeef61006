//! Error handling and end-to-end tests against real media files.
//!
//! Fixture-backed tests require `tests/fixtures/generate_fixtures.sh` to have
//! been run and are skipped otherwise.

mod common;

use std::path::Path;

use framestep::{
    Command, FfmpegSource, PlaybackController, PlaybackOptions, PlaybackState, PlayerError,
    VideoSource,
};

use common::RecordingDisplay;

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";
const AUDIO_ONLY: &str = "tests/fixtures/audio_only.m4a";

#[test]
fn open_nonexistent_file() {
    let error = FfmpegSource::open("this_file_does_not_exist.mp4").unwrap_err();

    assert!(matches!(error, PlayerError::FileOpen { .. }));
    assert!(error.is_startup_fatal());
    let error_message = error.to_string();
    assert!(
        error_message.contains("Failed to open media file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let error = FfmpegSource::open(&invalid_file_path).unwrap_err();
    assert!(error.is_startup_fatal(), "unexpected error: {error}");
}

#[test]
fn open_file_without_video() {
    if !Path::new(AUDIO_ONLY).exists() {
        return;
    }

    let error = FfmpegSource::open(AUDIO_ONLY).unwrap_err();
    assert!(matches!(error, PlayerError::NoVideoStream));
}

#[test]
fn sample_descriptor() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let source = FfmpegSource::open(SAMPLE_VIDEO).expect("Failed to open test video");
    let descriptor = source.descriptor();
    assert_eq!((descriptor.width, descriptor.height), (320, 240));
    assert!((descriptor.frames_per_second() - 25.0).abs() < 1e-9);
    assert!((249..=251).contains(&descriptor.frame_count));
}

#[test]
fn sample_seeks_are_frame_exact() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let source = FfmpegSource::open(SAMPLE_VIDEO).expect("Failed to open test video");
    let mut decoder = framestep::FrameDecoder::new(source);
    for frame_number in [0, 1, 11, 12, 13, 100, 37, 249, 5] {
        let (frame, resolved) = decoder.seek_to_frame(frame_number).expect("seek failed");
        assert_eq!(resolved, frame_number);
        assert_eq!((frame.width(), frame.height()), (320, 240));
    }

    let error = decoder.seek_to_frame(999_999).unwrap_err();
    assert!(error.is_end_of_stream(), "unexpected error: {error}");
}

#[test]
fn sample_playback_session() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let source = FfmpegSource::open(SAMPLE_VIDEO).expect("Failed to open test video");
    let mut controller =
        PlaybackController::new(source, RecordingDisplay::default(), PlaybackOptions::new());
    controller.start().expect("start failed");

    for _ in 0..3 {
        controller.handle(Command::StepForward).unwrap();
    }
    controller.handle(Command::StepBackward).unwrap();
    assert_eq!(controller.current_frame(), 2);

    controller.handle(Command::Play).unwrap();
    controller.tick().unwrap();
    controller.tick().unwrap();
    assert_eq!(controller.current_frame(), 4);
    assert_eq!(controller.state(), PlaybackState::Playing);
}
