//! Run orchestration.
//!
//! Everything happens strictly in sequence: resolve configuration,
//! discover inputs, load the model once, transcribe one input at a
//! time, then persist the aggregated results. Any failure along the way
//! aborts the run; accumulated transcriptions are only ever written at
//! the end.

use crate::config::Args;
use crate::discover::{self, AUDIO_FILENAME};
use crate::results;
use crate::storage;
use crate::transcribe::{self, TranscribeOptions, Transcriber, Transcript};
use anyhow::{Context, Result};
use object_store::DynObjectStore;
use object_store::path::Path as ObjectPath;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info};

/// Execute one full run from parsed CLI arguments.
pub async fn run(args: Args) -> Result<()> {
    let config = args.resolve().await?;

    let inputs = discover::discover(&config).await?;
    info!(inputs = inputs.len(), "Input discovery complete");

    let mut transcriber =
        transcribe::load_model(config.model_type, &config.checkpoint, &config.model_size)?;

    // Discovery returned object keys iff any resource was cloud-resident
    let input_store = if config.cloud.any() {
        config.store.as_deref()
    } else {
        None
    };

    let results = run_batch(
        transcriber.as_mut(),
        &inputs,
        input_store,
        &config.options,
    )
    .await?;
    info!(results = results.len(), "Transcription complete");

    if config.save_outputs {
        results::save_results(&results, &config.output, config.store.as_deref()).await?;
    } else {
        debug!("save_outputs disabled, results discarded");
    }
    Ok(())
}

/// Transcribe every input in order, keyed by its identifier.
///
/// When `input_store` is set the identifiers are object keys; each one
/// is staged into a scoped temporary directory before transcription and
/// the staging is removed when the batch finishes, success or not.
pub async fn run_batch(
    transcriber: &mut dyn Transcriber,
    inputs: &[String],
    input_store: Option<&DynObjectStore>,
    options: &TranscribeOptions,
) -> Result<BTreeMap<String, Transcript>> {
    let staging = match input_store {
        Some(_) => Some(TempDir::new().context("Failed to create staging directory")?),
        None => None,
    };

    let mut results = BTreeMap::new();
    for (index, input) in inputs.iter().enumerate() {
        let local_path = match (input_store, &staging) {
            (Some(store), Some(staging)) => {
                stage_input(store, input, staging.path().join(index.to_string())).await?
            }
            _ => PathBuf::from(input),
        };

        info!(input = %input, "Transcribing");
        let transcript = transcriber
            .transcribe(&local_path, options)
            .with_context(|| format!("Transcription failed for {input}"))?;
        results.insert(input.clone(), transcript);
    }
    Ok(results)
}

/// Download one remote input into its own staging subdirectory.
async fn stage_input(store: &DynObjectStore, key: &str, dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let location = ObjectPath::from(key);
    let filename = location.filename().unwrap_or(AUDIO_FILENAME).to_string();
    let dest = dir.join(filename);
    storage::download_object(store, &location, &dest).await?;
    Ok(dest)
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
