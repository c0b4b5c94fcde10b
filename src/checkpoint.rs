//! Checkpoint synchronization.
//!
//! Mirrors every object under a bucket prefix into a local directory,
//! one file per object basename. Files that already exist locally are
//! left untouched; nothing is ever deleted. Checkpoints are treated as
//! immutable artifacts, so there is no checksum or staleness comparison.

use crate::storage;
use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{DynObjectStore, ObjectStore};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Mirror the objects under `remote_prefix` into `local_dir`.
///
/// Creates `local_dir` (recursively) if absent. An empty prefix match is
/// a no-op beyond directory creation, not an error. Any listing,
/// download, or filesystem failure aborts the sync.
pub async fn sync(store: &DynObjectStore, remote_prefix: &str, local_dir: &Path) -> Result<()> {
    fs::create_dir_all(local_dir)
        .await
        .with_context(|| format!("Failed to create {}", local_dir.display()))?;

    let prefix = ObjectPath::from(remote_prefix);
    let mut objects = store.list(Some(&prefix));

    let mut downloaded = 0usize;
    let mut skipped = 0usize;
    while let Some(meta) = objects
        .try_next()
        .await
        .with_context(|| format!("Failed to list objects under {remote_prefix}"))?
    {
        let Some(filename) = meta.location.filename() else {
            continue;
        };
        let dest = local_dir.join(filename);
        if dest.exists() {
            debug!(path = %dest.display(), "Already present, skipping");
            skipped += 1;
            continue;
        }
        storage::download_object(store, &meta.location, &dest).await?;
        info!(path = %dest.display(), "Download complete");
        downloaded += 1;
    }

    debug!(
        prefix = remote_prefix,
        downloaded, skipped, "Checkpoint sync finished"
    );
    Ok(())
}

#[cfg(test)]
#[path = "checkpoint_test.rs"]
mod tests;
