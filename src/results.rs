//! Result persistence.
//!
//! The aggregated results map is serialized once, at the end of a run,
//! as a JSON object keyed by input identifier. Remote output goes
//! through a scoped staging directory that is removed on every exit
//! path.

use crate::config::Location;
use crate::storage;
use crate::transcribe::Transcript;
use anyhow::{Context, Result, bail};
use object_store::DynObjectStore;
use std::collections::BTreeMap;
use tempfile::TempDir;
use tokio::fs;
use tracing::info;

/// Fixed filename of the persisted results.
pub const RESULTS_FILENAME: &str = "ASR_results.json";

/// Serialize `results` and write them under the output location.
///
/// Local output lands directly in the output directory; remote output is
/// written into a temporary directory first and then uploaded to
/// `<output_prefix>/ASR_results.json`.
pub async fn save_results(
    results: &BTreeMap<String, Transcript>,
    output: &Location,
    store: Option<&DynObjectStore>,
) -> Result<()> {
    let json = serde_json::to_string(results).context("Failed to serialize results")?;

    match (output, store) {
        (Location::Local(dir), _) => {
            let outpath = dir.join(RESULTS_FILENAME);
            fs::write(&outpath, &json)
                .await
                .with_context(|| format!("Failed to write {}", outpath.display()))?;
            info!(path = %outpath.display(), entries = results.len(), "Results saved");
        }
        (Location::Remote(prefix), Some(store)) => {
            let staging = TempDir::new().context("Failed to create staging directory")?;
            let tmppath = staging.path().join(RESULTS_FILENAME);
            fs::write(&tmppath, &json)
                .await
                .with_context(|| format!("Failed to write {}", tmppath.display()))?;

            let key = format!("{}/{}", prefix.trim_end_matches('/'), RESULTS_FILENAME);
            storage::upload_file(store, &tmppath, &key).await?;
            info!(key, entries = results.len(), "Results saved");
            // staging dropped here, removing the temporary file
        }
        (Location::Remote(_), None) => {
            bail!("Remote output requires a bucket handle");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "results_test.rs"]
mod tests;
