//! Wire types returned by the catalog API

use serde::{Deserialize, Serialize};

/// A hypermedia link as embedded in catalog records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// End-user license agreement attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Eula {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Links carried by a release record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseLinks {
    #[serde(default)]
    pub product_files: Option<Link>,
}

/// One published version of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub version: String,
    #[serde(default)]
    pub release_type: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub eula: Eula,
    #[serde(rename = "_links", default)]
    pub links: ReleaseLinks,
}

/// Release list response for `GET /products/{slug}/releases`
#[derive(Debug, Clone, Deserialize)]
pub struct ReleasesResponse {
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// Links carried by a product file record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFileLinks {
    #[serde(default)]
    pub download: Option<Link>,
}

/// One downloadable artifact belonging to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFile {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_version: String,
    /// Not reliably populated by the catalog; see [`trusted_md5`]
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub aws_object_key: String,
    #[serde(rename = "_links", default)]
    pub links: ProductFileLinks,
}

impl ProductFile {
    /// File name the artifact is stored under: the last segment of its object key
    ///
    /// Returns `None` when the key does not end in a usable file name.
    pub fn file_name(&self) -> Option<&str> {
        let name = self.aws_object_key.rsplit('/').next()?;
        match name {
            "" | "." | ".." => None,
            name if name.contains('\\') => None,
            name => Some(name),
        }
    }

    pub fn download_url(&self) -> Option<&str> {
        self.links.download.as_ref().map(|link| link.href.as_str())
    }
}

/// Product file list response for a release's product files link
#[derive(Debug, Clone, Deserialize)]
pub struct ProductFilesResponse {
    #[serde(default)]
    pub product_files: Vec<ProductFile>,
}

/// The part of a product file needed to transfer it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    /// File name inside the destination directory, also the glob target
    pub name: String,
    pub url: String,
    /// Lowercase hex MD5, present only when the catalog value looks genuine
    pub md5: Option<String>,
}

impl DownloadLink {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            md5: None,
        }
    }

    pub fn with_md5<S: AsRef<str>>(mut self, md5: S) -> Self {
        self.md5 = trusted_md5(md5.as_ref());
        self
    }
}

/// Accept a catalog checksum only if it is a well-formed MD5 digest
///
/// The catalog stores placeholders such as `not-supported-yet` for files
/// uploaded without a checksum.
pub fn trusted_md5(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(raw.to_ascii_lowercase())
    } else {
        None
    }
}
