//! File operation utilities
//!
//! Downloads are written to a `.part` sibling and renamed into place, so a
//! destination path either holds a complete file or nothing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::error::{DownloadError, FileOperation, Result};

/// Path used while a download is in progress: `<name>.part`
pub fn create_temp_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Atomically rename a temporary file to its final destination
pub async fn atomic_rename(temp_path: &Path, dest_path: &Path) -> Result<()> {
    fs::rename(temp_path, dest_path)
        .await
        .map_err(|e| DownloadError::file_system(dest_path, FileOperation::Move, e))?;
    debug!("Atomically renamed {} to {}", temp_path.display(), dest_path.display());
    Ok(())
}

/// Remove a file, treating "already gone" as success
///
/// Cleanup runs on error paths, so failures are logged rather than returned.
pub async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Remove both the final file and any partial file for a destination
pub async fn remove_download(dest_path: &Path) {
    remove_if_exists(&create_temp_path(dest_path)).await;
    remove_if_exists(dest_path).await;
}
