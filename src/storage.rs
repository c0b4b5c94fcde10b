//! Object-storage access.
//!
//! Thin seam over the `object_store` crate: connecting to a bucket and
//! moving single objects between the bucket and the local filesystem.
//! Everything else (listing, filtering) happens at the call sites that
//! need it.

use anyhow::{Context, Result};
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{DynObjectStore, ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Open a handle to the configured bucket.
///
/// Credentials come from the ambient environment (application-default
/// login or `GOOGLE_SERVICE_ACCOUNT`); the project name is only used for
/// diagnostics, since GCS addresses buckets globally.
pub fn connect(project: &str, bucket: &str) -> Result<Arc<DynObjectStore>> {
    info!(project, bucket, "Connecting to object store");
    let store = GoogleCloudStorageBuilder::from_env()
        .with_bucket_name(bucket)
        .build()
        .with_context(|| format!("Failed to open bucket {bucket}"))?;
    Ok(Arc::new(store))
}

/// Download one object to a local file.
pub async fn download_object(
    store: &DynObjectStore,
    location: &ObjectPath,
    dest: &Path,
) -> Result<()> {
    let bytes = store
        .get(location)
        .await
        .with_context(|| format!("Failed to download {location}"))?
        .bytes()
        .await
        .with_context(|| format!("Failed to read {location}"))?;
    fs::write(dest, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    debug!(object = %location, dest = %dest.display(), size = bytes.len(), "Object downloaded");
    Ok(())
}

/// Upload a local file to the bucket at `key`.
pub async fn upload_file(store: &DynObjectStore, local: &Path, key: &str) -> Result<()> {
    let bytes = fs::read(local)
        .await
        .with_context(|| format!("Failed to read {}", local.display()))?;
    let location = ObjectPath::from(key);
    store
        .put(&location, PutPayload::from(bytes))
        .await
        .with_context(|| format!("Failed to upload {key}"))?;
    info!(key, "Upload complete");
    Ok(())
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
