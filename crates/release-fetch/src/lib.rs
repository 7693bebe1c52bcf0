//! Release resolution and selective concurrent download
//!
//! This library fetches one release of a product from the release catalog and
//! downloads the subset of its product files selected by glob patterns.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use release_fetch::{CatalogClient, DownloadConfig, Downloader};
//! use release_fetch::pipeline::{self, Pipeline};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = pipeline::parse_request(
//!     r#"{"source": {"api_token": "token", "product_slug": "my-product"},
//!         "params": {"globs": ["*.ova"]},
//!         "version": {"product_version": "1.2.3"}}"#,
//! )?;
//!
//! let catalog = CatalogClient::new(request.source.client_config("my-tool/1.0"))?;
//! let downloader = Downloader::new(DownloadConfig::default())?;
//!
//! let response = Pipeline::new(catalog, downloader)
//!     .run(&request, Path::new("/tmp/release"))
//!     .await?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`catalog`]: typed HTTP client behind the [`Catalog`] trait
//! - [`resolver`]: release lookup by exact version, then its product files
//! - [`filter`]: download link projection and glob selection
//! - [`downloader`]: bounded, fail-fast concurrent transfers
//! - [`pipeline`]: request validation, orchestration and log redaction

pub mod catalog;
pub mod downloader;
pub mod filter;
pub mod pipeline;
pub mod resolver;

pub use catalog::client::DEFAULT_USER_AGENT;
pub use catalog::{Catalog, CatalogClient, CatalogError, ClientConfig, DEFAULT_API_URL, DownloadLink, ProductFile, Release};
pub use downloader::{DownloadConfig, DownloadError, DownloadOutcome, DownloadResult, Downloader};
pub use filter::{FilterError, download_links, filter_by_globs};
pub use pipeline::{ErrorKind, InRequest, InResponse, Pipeline, PipelineError};
pub use resolver::{ReleaseResolver, ResolveError, ResolvedRelease};
