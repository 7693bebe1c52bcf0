//! Catalog access
//!
//! The [`Catalog`] trait is the seam between release resolution and the remote
//! HTTP API. [`CatalogClient`] is the production implementation; tests swap in
//! in-memory catalogs.

pub mod client;
pub mod error;
pub mod models;

pub use client::{CatalogClient, ClientConfig, DEFAULT_API_URL};
pub use error::CatalogError;
pub use models::{DownloadLink, Eula, Link, ProductFile, Release, ReleaseLinks};

use async_trait::async_trait;

/// Typed access to the release catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the release of `product_slug` whose version equals `version` exactly
    async fn get_release(&self, product_slug: &str, version: &str) -> Result<Release, CatalogError>;

    /// Fetch every product file attached to `release`, in catalog order
    async fn list_product_files(&self, release: &Release) -> Result<Vec<ProductFile>, CatalogError>;
}
