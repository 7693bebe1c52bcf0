//! Error types for the downloader with context and recovery information

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use super::DownloadResult;

#[derive(Error, Debug)]
pub enum DownloadError {
    /// Connection or body-stream failure
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to '{url}' timed out")]
    NetworkTimeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server answered {status} for '{url}'")]
    HttpStatus { url: String, status: StatusCode },

    #[error("File operation failed on '{path}' while {operation}")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("File size mismatch for '{file}': expected {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        file: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("MD5 mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Giving up on '{url}' after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: usize,
        #[source]
        source: Box<DownloadError>,
    },

    #[error("Download of '{file_name}' cancelled")]
    Cancelled { file_name: String },

    #[error("Download of '{file_name}' failed ({cancelled} other transfers cancelled)")]
    BatchAborted {
        file_name: String,
        cancelled: usize,
        /// Outcome of every link in the batch, in link order
        results: Vec<DownloadResult>,
        #[source]
        source: Box<DownloadError>,
    },

    #[error("Invalid download configuration: {message}")]
    Configuration { message: String },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Write,
    Move,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            DownloadError::NetworkTimeout {
                url: url.to_string(),
                source,
            }
        } else {
            DownloadError::HttpRequest {
                url: url.to_string(),
                source,
            }
        }
    }

    pub(crate) fn file_system(path: impl Into<PathBuf>, operation: FileOperation, source: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Check if error is recoverable (should retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            DownloadError::HttpRequest { .. } => true,
            DownloadError::NetworkTimeout { .. } => true,
            // Only server-side trouble is worth another attempt, not client errors (4xx)
            DownloadError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            DownloadError::FileSystem { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut
            ),
            DownloadError::SizeMismatch { .. } => false,
            DownloadError::ChecksumMismatch { .. } => false,
            DownloadError::RetriesExhausted { .. } => false,
            DownloadError::Cancelled { .. } => false,
            DownloadError::BatchAborted { .. } => false,
            DownloadError::Configuration { .. } => false,
        }
    }

    /// The failure that started it all, looking through retry and batch wrappers
    pub fn root(&self) -> &DownloadError {
        match self {
            DownloadError::RetriesExhausted { source, .. } | DownloadError::BatchAborted { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self.root() {
            DownloadError::HttpRequest { .. }
            | DownloadError::NetworkTimeout { .. }
            | DownloadError::HttpStatus { .. } => "transport",
            DownloadError::FileSystem { .. } => "filesystem",
            DownloadError::SizeMismatch { .. } | DownloadError::ChecksumMismatch { .. } => "integrity",
            DownloadError::Cancelled { .. } => "cancelled",
            DownloadError::Configuration { .. } => "configuration",
            DownloadError::RetriesExhausted { .. } | DownloadError::BatchAborted { .. } => "transport",
        }
    }
}
