//! Input discovery.
//!
//! Audio inputs are always named `waveform.wav`. Local discovery looks
//! exactly one directory level below the input root (one recording per
//! subdirectory); bucket discovery matches the filename at any depth
//! under the input prefix. No ordering is guaranteed either way.

use crate::config::{Location, RunConfig};
use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{DynObjectStore, ObjectStore};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed filename of every audio input.
pub const AUDIO_FILENAME: &str = "waveform.wav";

/// Enumerate input identifiers for the run.
///
/// If any resource is cloud-resident the bucket is searched, otherwise
/// the local input directory is scanned. Identifiers are full object
/// keys or absolute local paths. An empty result is valid.
pub async fn discover(config: &RunConfig) -> Result<Vec<String>> {
    if config.cloud.any() {
        let store = config
            .store
            .as_deref()
            .context("Cloud discovery requires a bucket handle")?;
        search_store(store, &config.input.as_prefix()).await
    } else {
        let Location::Local(root) = &config.input else {
            unreachable!("local discovery implies a local input");
        };
        let found = scan_local(root)?;
        Ok(found
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }
}

/// List all `waveform.wav` objects under `prefix`, returning full keys.
pub async fn search_store(store: &DynObjectStore, prefix: &str) -> Result<Vec<String>> {
    let prefix = ObjectPath::from(prefix);
    let mut objects = store.list(Some(&prefix));

    let mut found = Vec::new();
    while let Some(meta) = objects
        .try_next()
        .await
        .with_context(|| format!("Failed to list objects under {prefix}"))?
    {
        if meta.location.filename() == Some(AUDIO_FILENAME) {
            found.push(meta.location.to_string());
        }
    }
    debug!(prefix = %prefix, count = found.len(), "Bucket discovery finished");
    Ok(found)
}

/// Find `<root>/*/waveform.wav` on the local filesystem.
pub fn scan_local(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to read input directory {}", root.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", root.display()))?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let candidate = entry.path().join(AUDIO_FILENAME);
        if candidate.is_file() {
            found.push(candidate);
        }
    }
    debug!(root = %root.display(), count = found.len(), "Local discovery finished");
    Ok(found)
}

#[cfg(test)]
#[path = "discover_test.rs"]
mod tests;
