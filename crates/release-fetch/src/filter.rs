//! Download link projection and glob filtering
//!
//! Both functions are pure: they take catalog data and user patterns and
//! return the exact set of files to transfer.

use std::collections::HashSet;

use glob::Pattern;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{DownloadLink, ProductFile};

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("no product files match glob '{pattern}'")]
    NoMatchForPattern { pattern: String },

    #[error("invalid glob '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("product file {id} ('{name}') has no usable file name")]
    UnnamedProductFile { id: u64, name: String },

    #[error("product file {id} ('{name}') has no download link")]
    MissingDownloadLink { id: u64, name: String },
}

/// Project product files onto the links needed to download them
///
/// Links keep catalog order. A file name seen twice keeps its first
/// occurrence, so every link maps to a distinct path on disk.
pub fn download_links(product_files: &[ProductFile]) -> Result<Vec<DownloadLink>, FilterError> {
    let mut seen = HashSet::new();
    let mut links = Vec::with_capacity(product_files.len());

    for file in product_files {
        let name = file.file_name().ok_or_else(|| FilterError::UnnamedProductFile {
            id: file.id,
            name: file.name.clone(),
        })?;
        let url = file.download_url().ok_or_else(|| FilterError::MissingDownloadLink {
            id: file.id,
            name: file.name.clone(),
        })?;

        if !seen.insert(name.to_string()) {
            warn!("Skipping product file {} with duplicate file name '{}'", file.id, name);
            continue;
        }

        let mut link = DownloadLink::new(name, url);
        if let Some(md5) = file.md5.as_deref() {
            link = link.with_md5(md5);
        }
        links.push(link);
    }

    Ok(links)
}

/// Narrow `links` to those whose file name matches at least one glob
///
/// An empty glob list selects everything. Every glob must match at least one
/// link; the first one that matches nothing fails the whole filter.
pub fn filter_by_globs(links: Vec<DownloadLink>, globs: &[String]) -> Result<Vec<DownloadLink>, FilterError> {
    if globs.is_empty() {
        return Ok(links);
    }

    let patterns = globs
        .iter()
        .map(|glob| {
            Pattern::new(glob).map_err(|source| FilterError::InvalidPattern {
                pattern: glob.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut selected = vec![false; links.len()];
    for pattern in &patterns {
        let mut matched = 0;
        for (index, link) in links.iter().enumerate() {
            if pattern.matches(&link.name) {
                selected[index] = true;
                matched += 1;
            }
        }

        debug!("Glob '{}' matched {} files", pattern.as_str(), matched);
        if matched == 0 {
            return Err(FilterError::NoMatchForPattern {
                pattern: pattern.as_str().to_string(),
            });
        }
    }

    let mut names = HashSet::new();
    Ok(links
        .into_iter()
        .zip(selected)
        .filter(|(link, keep)| *keep && names.insert(link.name.clone()))
        .map(|(link, _)| link)
        .collect())
}
