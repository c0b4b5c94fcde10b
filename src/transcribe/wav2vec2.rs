//! wav2vec2 transcription backend.
//!
//! Runs a CTC ONNX export of wav2vec2 via ONNX Runtime and decodes the
//! logits greedily. The vocabulary is the HF-style `vocab.json` shipped
//! next to the model, with `|` as the word delimiter and `<pad>` as the
//! CTC blank. Word timestamps are derived from frame indices.

use super::{SAMPLE_RATE, Segment, TranscribeOptions, Transcriber, Transcript, build_transcript};
use crate::audio;
use anyhow::{Context, Result, bail, ensure};
use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const WORD_DELIMITER: &str = "|";
const PAD_TOKEN: &str = "<pad>";

/// wav2vec2 speech-to-text transcriber.
pub struct Wav2Vec2Transcriber {
    session: Session,
    vocab: Vec<String>,
    pad_id: usize,
    input_name: String,
    output_name: String,
}

impl Wav2Vec2Transcriber {
    /// Load a wav2vec2 ONNX export.
    ///
    /// `checkpoint` is a directory holding the model (`model.onnx`,
    /// `<model_size>.onnx`, or the only `.onnx` file present) and its
    /// `vocab.json`.
    pub fn new(checkpoint: &Path, model_size: &str) -> Result<Self> {
        let model_path = find_model_file(checkpoint, model_size)?;
        let vocab_path = if checkpoint.is_dir() {
            checkpoint.join("vocab.json")
        } else {
            checkpoint.with_file_name("vocab.json")
        };
        info!(path = %model_path.display(), "Loading wav2vec2 model");

        let (vocab, pad_id) = load_vocab(&vocab_path)?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load {}", model_path.display()))?;

        ensure!(
            !session.inputs().is_empty() && !session.outputs().is_empty(),
            "Model has no inputs or outputs"
        );
        let input_name = session.inputs()[0].name().to_string();
        let output_name = session.outputs()[0].name().to_string();
        debug!(
            input = %input_name,
            output = %output_name,
            vocab = vocab.len(),
            "wav2vec2 model loaded"
        );

        Ok(Self {
            session,
            vocab,
            pad_id,
            input_name,
            output_name,
        })
    }
}

/// Find the ONNX file inside a checkpoint directory.
fn find_model_file(checkpoint: &Path, model_size: &str) -> Result<PathBuf> {
    if checkpoint.is_file() {
        return Ok(checkpoint.to_path_buf());
    }
    for name in ["model.onnx".to_string(), format!("{model_size}.onnx")] {
        let candidate = checkpoint.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    // Fallback: a checkpoint directory with a single .onnx file
    let onnx_files: Vec<PathBuf> = std::fs::read_dir(checkpoint)
        .with_context(|| format!("Failed to read {}", checkpoint.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "onnx"))
        .collect();
    match onnx_files.as_slice() {
        [only] => Ok(only.clone()),
        [] => bail!("No .onnx model found in {}", checkpoint.display()),
        _ => bail!(
            "Multiple .onnx files in {}, name one model.onnx or {model_size}.onnx",
            checkpoint.display()
        ),
    }
}

/// Load the HF-style token -> id mapping and locate the CTC blank.
fn load_vocab(path: &Path) -> Result<(Vec<String>, usize)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mapping: HashMap<String, u32> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut vocab = vec![String::new(); mapping.len()];
    for (token, id) in mapping {
        let id = id as usize;
        ensure!(
            id < vocab.len(),
            "Token ids in {} are not contiguous",
            path.display()
        );
        vocab[id] = token;
    }
    let pad_id = vocab
        .iter()
        .position(|t| t == PAD_TOKEN)
        .with_context(|| format!("{} has no {PAD_TOKEN} token", path.display()))?;
    Ok((vocab, pad_id))
}

/// Zero-mean, unit-variance normalization, matching the HF feature extractor.
fn normalize(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / samples.len() as f32;
    let denom = (var + 1e-7).sqrt();
    samples.iter().map(|s| (s - mean) / denom).collect()
}

/// Greedy CTC decode of per-frame argmax ids into timed words.
///
/// Repeated ids are collapsed, blanks separate emissions, and the `|`
/// token closes a word. Specials (`<...>`) are ignored.
fn decode_words(frame_ids: &[usize], vocab: &[String], pad_id: usize, frame_s: f32) -> Vec<Segment> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start_frame = 0usize;
    let mut end_frame = 0usize;
    let mut prev_id: Option<usize> = None;

    let mut flush = |current: &mut String, start: usize, end: usize, words: &mut Vec<Segment>| {
        if !current.is_empty() {
            words.push(Segment {
                text: std::mem::take(current),
                start_s: start as f32 * frame_s,
                end_s: (end + 1) as f32 * frame_s,
            });
        }
    };

    for (t, &id) in frame_ids.iter().enumerate() {
        if prev_id == Some(id) {
            continue;
        }
        prev_id = Some(id);
        if id == pad_id {
            continue;
        }
        // The model's logit dimension can exceed the vocabulary (padded
        // embeddings); ids past the end carry no token.
        let Some(token) = vocab.get(id) else {
            continue;
        };
        if token == WORD_DELIMITER {
            flush(&mut current, start_frame, end_frame, &mut words);
            continue;
        }
        if token.starts_with('<') {
            continue;
        }
        if current.is_empty() {
            start_frame = t;
        }
        current.push_str(token);
        end_frame = t;
    }
    flush(&mut current, start_frame, end_frame, &mut words);
    words
}

impl Transcriber for Wav2Vec2Transcriber {
    fn transcribe(&mut self, path: &Path, options: &TranscribeOptions) -> Result<Transcript> {
        let (samples, sample_rate) = audio::read_wav(path)?;
        if sample_rate != SAMPLE_RATE {
            bail!(
                "wav2vec2 expects {}Hz audio, got {}Hz: {}",
                SAMPLE_RATE,
                sample_rate,
                path.display()
            );
        }
        let duration_s = samples.len() as f32 / SAMPLE_RATE as f32;
        debug!(
            path = %path.display(),
            samples = samples.len(),
            duration_secs = duration_s,
            "Transcribing audio with wav2vec2"
        );

        let normalized = normalize(&samples);
        let input = Array2::from_shape_vec((1, normalized.len()), normalized)
            .context("Failed to shape input tensor")?
            .into_dyn();

        let run_inputs = inputs![
            self.input_name.as_str() => TensorRef::from_array_view(input.view())?,
        ];
        let outputs = self
            .session
            .run(run_inputs)
            .context("wav2vec2 inference failed")?;

        // Logits are [1, frames, vocab]
        let logits = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("Model output {} not found", self.output_name))?
            .try_extract_array::<f32>()?
            .to_owned()
            .into_dimensionality::<ndarray::Ix3>()
            .context("Unexpected logits shape")?;

        let frames = logits.shape()[1];
        ensure!(frames > 0, "Model produced no frames");
        let frame_s = duration_s / frames as f32;

        let frame_ids: Vec<usize> = logits
            .index_axis(ndarray::Axis(0), 0)
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(id, _)| id)
                    .unwrap_or(self.pad_id)
            })
            .collect();

        let words = decode_words(&frame_ids, &self.vocab, self.pad_id, frame_s);
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        debug!(
            text_len = text.len(),
            words = words.len(),
            "Transcription complete"
        );
        Ok(build_transcript(text, words, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vocab() -> Vec<String> {
        ["<pad>", "<s>", "</s>", "<unk>", "|", "a", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_decode_collapses_repeats_and_blanks() {
        // "ab" then "c", with repeats and blanks interleaved
        let frames = [5, 5, 0, 6, 4, 4, 7, 7, 0, 0];
        let words = decode_words(&frames, &vocab(), 0, 0.02);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "ab");
        assert_eq!(words[1].text, "c");
    }

    #[test]
    fn test_decode_blank_separates_repeated_letters() {
        // "aa" needs a blank between the two a-frames
        let frames = [5, 0, 5, 4];
        let words = decode_words(&frames, &vocab(), 0, 0.02);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "aa");
    }

    #[test]
    fn test_decode_word_timing() {
        let frames = [0, 5, 6, 0, 0];
        let words = decode_words(&frames, &vocab(), 0, 0.5);
        assert_eq!(words.len(), 1);
        assert!((words[0].start_s - 0.5).abs() < 1e-6);
        assert!((words[0].end_s - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_decode_ignores_specials_and_empty() {
        let frames = [1, 2, 3, 0];
        assert!(decode_words(&frames, &vocab(), 0, 0.02).is_empty());
        assert!(decode_words(&[], &vocab(), 0, 0.02).is_empty());
    }

    #[test]
    fn test_normalize_zero_mean() {
        let out = normalize(&[1.0, 2.0, 3.0, 4.0]);
        let mean = out.iter().sum::<f32>() / out.len() as f32;
        assert!(mean.abs() < 1e-5);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_load_vocab() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vocab.json");
        std::fs::write(&path, r#"{"<pad>": 0, "|": 1, "a": 2}"#).unwrap();

        let (vocab, pad_id) = load_vocab(&path).unwrap();
        assert_eq!(pad_id, 0);
        assert_eq!(vocab, vec!["<pad>", "|", "a"]);
    }

    #[test]
    fn test_load_vocab_rejects_sparse_ids() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vocab.json");
        std::fs::write(&path, r#"{"<pad>": 0, "a": 9}"#).unwrap();
        assert!(load_vocab(&path).is_err());
    }

    #[test]
    fn test_find_model_file_prefers_exact_names() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("model.onnx");
        std::fs::write(&model, b"x").unwrap();
        std::fs::write(temp.path().join("other.onnx"), b"x").unwrap();

        assert_eq!(find_model_file(temp.path(), "base").unwrap(), model);
    }

    #[test]
    fn test_find_model_file_single_fallback() {
        let temp = TempDir::new().unwrap();
        let model = temp.path().join("export.onnx");
        std::fs::write(&model, b"x").unwrap();

        assert_eq!(find_model_file(temp.path(), "base").unwrap(), model);
    }

    #[test]
    fn test_find_model_file_empty_dir_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(find_model_file(temp.path(), "base").is_err());
    }
}
