//! Pipeline errors, classified by kind and by the stage that failed

use std::path::PathBuf;
use thiserror::Error;

use crate::downloader::DownloadError;
use crate::filter::FilterError;
use crate::resolver::ResolveError;

/// Coarse classification of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    ReleaseNotFound,
    ProductFilesUnavailable,
    NoMatchForPattern,
    Transport,
    Integrity,
    Filesystem,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{message}")]
    Configuration { message: String },

    #[error("malformed request")]
    InvalidRequest(#[source] serde_json::Error),

    #[error(transparent)]
    GetRelease(ResolveError),

    #[error(transparent)]
    GetProductFiles(ResolveError),

    #[error(transparent)]
    InvalidProductFiles(FilterError),

    #[error(transparent)]
    FilterFiles(FilterError),

    #[error("product file '{name}' collides with the version marker")]
    ReservedFileName { name: String },

    #[error(transparent)]
    Download(DownloadError),

    #[error("could not write '{path}'")]
    WriteVersion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn configuration<S: Into<String>>(message: S) -> Self {
        PipelineError::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Configuration { .. } | PipelineError::InvalidRequest(_) => ErrorKind::Configuration,
            PipelineError::GetRelease(ResolveError::ReleaseNotFound { .. }) => ErrorKind::ReleaseNotFound,
            PipelineError::GetRelease(_) => ErrorKind::Transport,
            PipelineError::GetProductFiles(_)
            | PipelineError::InvalidProductFiles(_)
            | PipelineError::ReservedFileName { .. } => ErrorKind::ProductFilesUnavailable,
            PipelineError::FilterFiles(_) => ErrorKind::NoMatchForPattern,
            PipelineError::Download(e) => match e.category() {
                "integrity" => ErrorKind::Integrity,
                "filesystem" => ErrorKind::Filesystem,
                "configuration" => ErrorKind::Configuration,
                _ => ErrorKind::Transport,
            },
            PipelineError::WriteVersion { .. } => ErrorKind::Filesystem,
        }
    }

    /// What the pipeline was doing when it failed, as in "Failed to <stage>"
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Configuration { .. } | PipelineError::InvalidRequest(_) => "validate input",
            PipelineError::GetRelease(_) => "get release",
            PipelineError::GetProductFiles(_) | PipelineError::InvalidProductFiles(_) => "get product files",
            PipelineError::FilterFiles(_) | PipelineError::ReservedFileName { .. } => "filter product files",
            PipelineError::Download(_) => "download files",
            PipelineError::WriteVersion { .. } => "write version file",
        }
    }
}
