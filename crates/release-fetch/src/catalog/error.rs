//! Catalog client errors

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Connection-level failure before any status was received
    #[error("request to '{url}' failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' not found (status {status}): {body}")]
    NotFound {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("not authorized for '{url}' (status {status}), check the api token: {body}")]
    Unauthorized {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected response from '{url}' (status {status}): {body}")]
    Transport {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("could not decode response from '{url}': {body}")]
    Decode {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no release of '{product_slug}' has version '{version}'")]
    ReleaseMissing {
        product_slug: String,
        version: String,
    },

    #[error("release '{version}' has no '{rel}' link")]
    MissingLink {
        version: String,
        rel: &'static str,
    },

    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl CatalogError {
    /// Raw HTTP status, when the catalog answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogError::NotFound { status, .. }
            | CatalogError::Unauthorized { status, .. }
            | CatalogError::Transport { status, .. } => Some(*status),
            CatalogError::Http { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Classify a non-success response by status
    pub(crate) fn from_status(url: String, status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => CatalogError::NotFound { url, status, body },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CatalogError::Unauthorized { url, status, body }
            }
            _ => CatalogError::Transport { url, status, body },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. } | CatalogError::ReleaseMissing { .. })
    }
}
