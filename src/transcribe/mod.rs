//! Speech-to-text transcription.
//!
//! This module provides a trait abstraction for transcription backends
//! and implementations for the supported model families. Backends are
//! selected by the closed `ModelKind` enum; adding a family means adding
//! one variant and one match arm in `load_model`.

use crate::config::ModelKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod wav2vec2;
mod whisper;

pub use wav2vec2::Wav2Vec2Transcriber;
pub use whisper::WhisperTranscriber;

/// Sample rate both backends expect.
pub const SAMPLE_RATE: u32 = 16000;

/// Per-run transcription options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscribeOptions {
    /// Report per-segment timestamps.
    pub return_timestamps: bool,
    /// Report silences longer than `pause_s`.
    pub return_pauses: bool,
    /// Minimum silence duration, in seconds, classified as a pause.
    pub pause_s: f32,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            return_timestamps: true,
            return_pauses: true,
            pause_s: 0.1,
        }
    }
}

/// A timed span of transcribed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start_s: f32,
    pub end_s: f32,
}

/// A silence interval exceeding the pause threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pause {
    pub start_s: f32,
    pub end_s: f32,
}

/// The result of transcribing one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pauses: Option<Vec<Pause>>,
}

/// Speech-to-text transcriber over audio files.
pub trait Transcriber: Send {
    /// Transcribe the WAV file at `path`.
    fn transcribe(&mut self, path: &Path, options: &TranscribeOptions) -> Result<Transcript>;
}

/// Construct the backend for `kind` from a local checkpoint.
///
/// Construction failure is fatal for the run and is not retried.
pub fn load_model(
    kind: ModelKind,
    checkpoint: &Path,
    model_size: &str,
) -> Result<Box<dyn Transcriber>> {
    match kind {
        ModelKind::W2v2 => Ok(Box::new(Wav2Vec2Transcriber::new(checkpoint, model_size)?)),
        ModelKind::Whisper => Ok(Box::new(WhisperTranscriber::new(checkpoint, model_size)?)),
    }
}

/// Silences between consecutive segments that last at least `pause_s`.
pub fn find_pauses(segments: &[Segment], pause_s: f32) -> Vec<Pause> {
    segments
        .windows(2)
        .filter_map(|pair| {
            let gap = pair[1].start_s - pair[0].end_s;
            (gap > 0.0 && gap >= pause_s).then_some(Pause {
                start_s: pair[0].end_s,
                end_s: pair[1].start_s,
            })
        })
        .collect()
}

/// Assemble a `Transcript`, honoring the timestamp and pause options.
pub(crate) fn build_transcript(
    text: String,
    segments: Vec<Segment>,
    options: &TranscribeOptions,
) -> Transcript {
    let pauses = options
        .return_pauses
        .then(|| find_pauses(&segments, options.pause_s));
    Transcript {
        text,
        segments: options.return_timestamps.then_some(segments),
        pauses,
    }
}
