//! Release resolution
//!
//! Resolution is two explicit steps against a [`Catalog`]: look the release up
//! by exact version, then fetch its product files. No filtering happens here.

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogError, ProductFile, Release};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("release '{version}' of '{product_slug}' not found")]
    ReleaseNotFound {
        product_slug: String,
        version: String,
        #[source]
        source: CatalogError,
    },

    #[error("product files of release '{version}' unavailable")]
    ProductFilesUnavailable {
        version: String,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A release together with every product file the catalog reports for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub release: Release,
    pub product_files: Vec<ProductFile>,
}

pub struct ReleaseResolver<C> {
    catalog: C,
}

impl<C: Catalog> ReleaseResolver<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn fetch_release(&self, product_slug: &str, version: &str) -> Result<Release, ResolveError> {
        debug!("Fetching release '{}' of '{}'", version, product_slug);
        self.catalog
            .get_release(product_slug, version)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ResolveError::ReleaseNotFound {
                        product_slug: product_slug.to_string(),
                        version: version.to_string(),
                        source: e,
                    }
                } else {
                    ResolveError::Catalog(e)
                }
            })
    }

    pub async fn fetch_files(&self, release: &Release) -> Result<Vec<ProductFile>, ResolveError> {
        self.catalog
            .list_product_files(release)
            .await
            .map_err(|source| ResolveError::ProductFilesUnavailable {
                version: release.version.clone(),
                source,
            })
    }

    pub async fn resolve(&self, product_slug: &str, version: &str) -> Result<ResolvedRelease, ResolveError> {
        let release = self.fetch_release(product_slug, version).await?;
        let product_files = self.fetch_files(&release).await?;

        info!(
            "Resolved '{}' {} ({}) with {} product files",
            product_slug,
            release.version,
            release.release_type,
            product_files.len()
        );

        Ok(ResolvedRelease { release, product_files })
    }
}
