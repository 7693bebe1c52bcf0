//! Concurrent downloader
//!
//! Transfers a set of [`DownloadLink`]s into a destination directory over a
//! fixed-size worker pool. A batch is all-or-nothing: either every file lands
//! complete on disk, or none of them remain.

pub mod batch;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod metrics;

pub use config::{DEFAULT_MAX_CONCURRENT_DOWNLOADS, DownloadConfig};
pub use error::{DownloadError, FileOperation, Result};
pub use http::HttpClient;
pub use metrics::{DownloadMetrics, DownloadMetricsSnapshot};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::catalog::DownloadLink;

/// How a single transfer ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    Failed(String),
    /// Stopped because another transfer in the batch failed
    Cancelled,
}

/// Per-file report of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes_written: u64,
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    pub(crate) fn new(link: &DownloadLink, path: PathBuf, bytes_written: u64, outcome: DownloadOutcome) -> Self {
        Self {
            file_name: link.name.clone(),
            path,
            bytes_written,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == DownloadOutcome::Downloaded
    }
}

/// Downloads batches of product files
pub struct Downloader {
    config: DownloadConfig,
    http: HttpClient,
    metrics: DownloadMetrics,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        if config.max_concurrent == 0 {
            return Err(DownloadError::Configuration {
                message: "max_concurrent must be at least 1".to_string(),
            });
        }

        let http = HttpClient::from_config(&config)?;
        Ok(Self {
            config,
            http,
            metrics: DownloadMetrics::default(),
        })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn metrics(&self) -> DownloadMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Download every link into `dest_dir`, creating it if needed
    ///
    /// Each file is written to `dest_dir/<link.name>`. `credential` is sent as
    /// the catalog API token on every request.
    pub async fn download(
        &self,
        dest_dir: &Path,
        links: &[DownloadLink],
        credential: &str,
    ) -> Result<Vec<DownloadResult>> {
        validate_links(links)?;

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| DownloadError::file_system(dest_dir, FileOperation::CreateDir, e))?;

        info!(
            "Downloading {} files to {} ({} at a time)",
            links.len(),
            dest_dir.display(),
            self.config.max_concurrent
        );

        let result = batch::download_batch(&self.http, &self.config, &self.metrics, dest_dir, links, credential).await;
        info!("Download metrics: {}", self.metrics.snapshot());
        result
    }
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Every link must name a distinct plain file inside the destination directory
fn validate_links(links: &[DownloadLink]) -> Result<()> {
    let mut names = HashSet::new();
    for link in links {
        let name = link.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(DownloadError::Configuration {
                message: format!("'{}' is not a plain file name", name),
            });
        }
        if !names.insert(name) {
            return Err(DownloadError::Configuration {
                message: format!("file name '{}' appears more than once", name),
            });
        }
    }
    Ok(())
}
