//! Command-line arguments and run configuration.
//!
//! `Args` is the raw clap surface; `resolve()` validates it and produces an
//! immutable `RunConfig` that every component reads from. The bucket handle
//! is owned by the `RunConfig` and passed down explicitly, never held in
//! process-wide state.

use crate::checkpoint;
use crate::storage;
use crate::transcribe::TranscribeOptions;
use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use object_store::DynObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Supported speech recognition model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// wav2vec2 CTC model (ONNX export).
    W2v2,
    /// Whisper model (GGML file for whisper.cpp).
    Whisper,
}

/// Batch speech-to-text over directories of `waveform.wav` files.
#[derive(Debug, Parser)]
#[command(name = "wavscribe", version)]
pub struct Args {
    /// Directory (or bucket prefix) containing the wav files to process.
    #[arg(long = "input_dir", default_value = "")]
    pub input_dir: String,

    /// Whether to persist results after the run.
    #[arg(long = "save_outputs", default_value_t = false, action = ArgAction::Set, value_name = "BOOL")]
    pub save_outputs: bool,

    /// Directory (or bucket prefix) where results should be saved.
    #[arg(long = "output_dir", default_value = "")]
    pub output_dir: String,

    /// Model family to use.
    #[arg(long = "model_type", value_enum, default_value = "w2v2")]
    pub model_type: ModelKind,

    /// Model size identifier, interpreted by the selected backend.
    #[arg(long = "model_size", default_value = "base")]
    pub model_size: String,

    /// Model weights location (path, or bucket prefix with --cloud).
    #[arg(long, default_value = "")]
    pub checkpoint: String,

    /// Whether to report per-segment timestamps.
    #[arg(long = "return_timestamps", default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub return_timestamps: bool,

    /// Whether to report long pauses between segments.
    #[arg(long = "return_pauses", default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub return_pauses: bool,

    /// Minimum silence duration, in seconds, classified as a pause.
    #[arg(long = "pause_s", default_value_t = 0.1)]
    pub pause_s: f32,

    /// Per-resource cloud flags: [input_dir, output_dir, checkpoint].
    #[arg(long, num_args = 1.., value_name = "BOOL", default_values_t = [false, false, false])]
    pub cloud: Vec<bool>,

    /// Staging root for files downloaded from the bucket.
    #[arg(long = "local_dir", default_value = "")]
    pub local_dir: String,

    /// Object-storage bucket name.
    #[arg(short = 'b', long = "bucket_name", default_value = "")]
    pub bucket_name: String,

    /// Cloud project name.
    #[arg(short = 'p', long = "project_name", default_value = "")]
    pub project_name: String,
}

/// Which of the three resources live in the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudFlags {
    pub input: bool,
    pub output: bool,
    pub checkpoint: bool,
}

impl CloudFlags {
    /// Parse the positional `--cloud` values; exactly three are required.
    pub fn from_slice(flags: &[bool]) -> Result<Self> {
        let &[input, output, checkpoint] = flags else {
            bail!(
                "--cloud expects exactly three values (input, output, checkpoint), got {}",
                flags.len()
            );
        };
        Ok(Self {
            input,
            output,
            checkpoint,
        })
    }

    /// True if any resource is bucket-resident.
    pub fn any(&self) -> bool {
        self.input || self.output || self.checkpoint
    }
}

/// A resource root that is either a local directory or a bucket prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote(String),
}

impl Location {
    /// The location as a prefix string for bucket listings.
    pub fn as_prefix(&self) -> String {
        match self {
            Location::Local(path) => path.to_string_lossy().into_owned(),
            Location::Remote(prefix) => prefix.clone(),
        }
    }
}

/// Resolved, read-only configuration for one run.
#[derive(Debug)]
pub struct RunConfig {
    pub input: Location,
    pub output: Location,
    /// Always a local path: a pre-existing directory/file, or the staging
    /// directory a remote checkpoint was mirrored into.
    pub checkpoint: PathBuf,
    pub model_type: ModelKind,
    pub model_size: String,
    pub options: TranscribeOptions,
    pub save_outputs: bool,
    pub cloud: CloudFlags,
    pub store: Option<Arc<DynObjectStore>>,
}

/// Absolutize a CLI path argument; an empty string means the current directory.
fn absolutize(raw: &str) -> Result<PathBuf> {
    let raw = if raw.is_empty() { "." } else { raw };
    std::path::absolute(raw).with_context(|| format!("Invalid path {raw}"))
}

impl Args {
    /// Validate the arguments and resolve every resource.
    ///
    /// Cloud credentials are checked once, centrally, before any
    /// resource-specific work. A remote checkpoint is mirrored into
    /// `<local_dir>/checkpoints` here, so the returned config always
    /// points at local weights.
    pub async fn resolve(self) -> Result<RunConfig> {
        let cloud = CloudFlags::from_slice(&self.cloud)?;

        let store = if cloud.any() {
            if self.project_name.is_empty() {
                bail!("Must give a project name (-p) for use with cloud");
            }
            if self.bucket_name.is_empty() {
                bail!("Must give a bucket name (-b) for use with cloud");
            }
            Some(storage::connect(&self.project_name, &self.bucket_name)?)
        } else {
            None
        };

        let input = if cloud.input {
            Location::Remote(self.input_dir)
        } else {
            let path = absolutize(&self.input_dir)?;
            if !path.exists() {
                bail!("Input directory {} does not exist locally", path.display());
            }
            Location::Local(path)
        };

        let output = if cloud.output {
            Location::Remote(self.output_dir)
        } else {
            let path = absolutize(&self.output_dir)?;
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create output directory {}", path.display()))?;
            Location::Local(path)
        };

        let checkpoint = if cloud.checkpoint {
            let store = store.as_deref().expect("cloud flag implies store");
            let staging = absolutize(&self.local_dir)?.join("checkpoints");
            info!(
                prefix = %self.checkpoint,
                staging = %staging.display(),
                "Staging remote checkpoint"
            );
            checkpoint::sync(store, &self.checkpoint, &staging).await?;
            staging
        } else {
            let path = absolutize(&self.checkpoint)?;
            if !path.exists() {
                bail!("Checkpoint {} does not exist locally", path.display());
            }
            path
        };

        debug!(?cloud, checkpoint = %checkpoint.display(), "Configuration resolved");

        Ok(RunConfig {
            input,
            output,
            checkpoint,
            model_type: self.model_type,
            model_size: self.model_size,
            options: TranscribeOptions {
                return_timestamps: self.return_timestamps,
                return_pauses: self.return_pauses,
                pause_s: self.pause_s,
            },
            save_outputs: self.save_outputs,
            cloud,
            store,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
