//! Whisper transcription backend.
//!
//! Uses whisper.cpp via whisper-rs. Segment timestamps come straight
//! from the decoder, in centiseconds.

use super::{SAMPLE_RATE, Segment, TranscribeOptions, Transcriber, Transcript, build_transcript};
use crate::audio;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperState,
};

/// Whisper speech-to-text transcriber.
///
/// The underlying WhisperContext is leaked intentionally: the model stays
/// loaded for the process lifetime, which avoids a self-referential
/// struct while the state is reused across every input in the batch.
pub struct WhisperTranscriber {
    state: WhisperState,
}

impl WhisperTranscriber {
    /// Load a Whisper model.
    ///
    /// `checkpoint` may be the GGML file itself, or a directory holding
    /// `ggml-<model_size>.bin`.
    pub fn new(checkpoint: &Path, model_size: &str) -> Result<Self> {
        let model_path = resolve_model_file(checkpoint, model_size)?;
        info!(path = %model_path.display(), "Loading Whisper model");

        let ctx = WhisperContext::new_with_params(
            model_path.to_str().context("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .context("Failed to load Whisper model")?;

        let ctx_ref: &'static WhisperContext = Box::leak(Box::new(ctx));
        let state = ctx_ref
            .create_state()
            .context("Failed to create Whisper state")?;

        info!("Whisper model and state loaded successfully");
        Ok(Self { state })
    }
}

fn resolve_model_file(checkpoint: &Path, model_size: &str) -> Result<PathBuf> {
    if checkpoint.is_file() {
        return Ok(checkpoint.to_path_buf());
    }
    let candidate = checkpoint.join(format!("ggml-{model_size}.bin"));
    if candidate.is_file() {
        return Ok(candidate);
    }
    bail!(
        "No Whisper model at {} (expected a GGML file, or ggml-{model_size}.bin inside it)",
        checkpoint.display()
    )
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&mut self, path: &Path, options: &TranscribeOptions) -> Result<Transcript> {
        let (samples, sample_rate) = audio::read_wav(path)?;
        if sample_rate != SAMPLE_RATE {
            bail!(
                "Whisper expects {}Hz audio, got {}Hz: {}",
                SAMPLE_RATE,
                sample_rate,
                path.display()
            );
        }

        debug!(
            path = %path.display(),
            samples = samples.len(),
            duration_secs = samples.len() as f32 / sample_rate as f32,
            "Transcribing audio with Whisper"
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(None); // Auto-detect

        // Disable printing to stdout
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        self.state
            .full(params, &samples)
            .context("Whisper inference failed")?;

        let num_segments = self.state.full_n_segments();
        let mut segments = Vec::new();
        let mut text = String::new();

        for i in 0..num_segments {
            let Some(segment) = self.state.get_segment(i) else {
                continue;
            };
            let Ok(seg_text) = segment.to_str_lossy() else {
                continue;
            };
            let seg_text = seg_text.trim().to_string();
            if seg_text.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&seg_text);
            segments.push(Segment {
                text: seg_text,
                start_s: segment.start_timestamp() as f32 / 100.0,
                end_s: segment.end_timestamp() as f32 / 100.0,
            });
        }

        debug!(
            text_len = text.len(),
            segments = segments.len(),
            "Transcription complete"
        );
        Ok(build_transcript(text, segments, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_model_file_in_directory() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("ggml-base.bin");
        std::fs::write(&model, b"not a real model").unwrap();

        assert_eq!(resolve_model_file(temp.path(), "base").unwrap(), model);
        assert_eq!(resolve_model_file(&model, "base").unwrap(), model);
    }

    #[test]
    fn test_resolve_model_file_missing() {
        let temp = TempDir::new().unwrap();
        let err = resolve_model_file(temp.path(), "base").unwrap_err();
        assert!(err.to_string().contains("ggml-base.bin"));
    }
}
