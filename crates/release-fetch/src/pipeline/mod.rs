//! The `in` step: resolve a release, select its files and download them
//!
//! [`Pipeline::run`] validates the request, resolves the release, narrows
//! its files by the requested globs, downloads them and finally writes a
//! `version` marker. Output is all-or-nothing.

pub mod error;
pub mod redact;
pub mod request;

pub use error::{ErrorKind, PipelineError};
pub use redact::{RedactingMakeWriter, RedactingWriter, Redactor, SECRET_FIELDS};
pub use request::{InRequest, InResponse, Metadata, Params, Source, Version};

use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::downloader::Downloader;
use crate::filter::{download_links, filter_by_globs};
use crate::resolver::ReleaseResolver;

/// Name of the marker file written next to the downloads
pub const VERSION_FILE: &str = "version";

/// Parse the stdin envelope
pub fn parse_request(input: &str) -> Result<InRequest, PipelineError> {
    serde_json::from_str(input).map_err(PipelineError::InvalidRequest)
}

/// Check required fields and return the requested version
pub fn validate(request: &InRequest) -> Result<&str, PipelineError> {
    if request.source.api_token.is_empty() {
        return Err(PipelineError::configuration("api_token must be provided"));
    }
    if request.source.product_slug.is_empty() {
        return Err(PipelineError::configuration("product_slug must be provided"));
    }
    match request.version.as_ref().map(|v| v.product_version.as_str()) {
        Some(version) if !version.is_empty() => Ok(version),
        _ => Err(PipelineError::configuration("version.product_version must be provided")),
    }
}

pub struct Pipeline<C> {
    resolver: ReleaseResolver<C>,
    downloader: Downloader,
}

impl<C: Catalog> Pipeline<C> {
    pub fn new(catalog: C, downloader: Downloader) -> Self {
        Self {
            resolver: ReleaseResolver::new(catalog),
            downloader,
        }
    }

    #[instrument(skip_all, fields(product = %request.source.product_slug))]
    pub async fn run(&self, request: &InRequest, dest_dir: &Path) -> Result<InResponse, PipelineError> {
        let version = validate(request)?;
        let product_slug = request.source.product_slug.as_str();

        let release = self
            .resolver
            .fetch_release(product_slug, version)
            .await
            .map_err(PipelineError::GetRelease)?;

        let product_files = self
            .resolver
            .fetch_files(&release)
            .await
            .map_err(PipelineError::GetProductFiles)?;

        let links = download_links(&product_files).map_err(PipelineError::InvalidProductFiles)?;
        let available = links.len();
        let links = filter_by_globs(links, &request.params.globs).map_err(PipelineError::FilterFiles)?;
        info!(
            "Selected {} of {} product files of {} {}",
            links.len(),
            available,
            product_slug,
            release.version
        );

        if let Some(link) = links.iter().find(|link| link.name == VERSION_FILE) {
            return Err(PipelineError::ReservedFileName {
                name: link.name.clone(),
            });
        }

        self.downloader
            .download(dest_dir, &links, &request.source.api_token)
            .await
            .map_err(PipelineError::Download)?;

        let version_path = dest_dir.join(VERSION_FILE);
        fs::write(&version_path, release.version.as_bytes())
            .await
            .map_err(|source| PipelineError::WriteVersion {
                path: version_path,
                source,
            })?;

        info!("Fetched {} {} into {}", product_slug, release.version, dest_dir.display());
        Ok(InResponse::for_release(&release))
    }
}

#[cfg(test)]
mod tests;
