//! HTTP transfer of a single product file
//!
//! Bodies are streamed chunk by chunk into `<name>.part` while the MD5 is
//! computed, then renamed into place once size and checksum check out.
//!
//! Cancellation is only observed while waiting on the network. File system
//! work in progress always runs to completion, so once a transfer returns
//! nothing it started is still touching the destination directory.

use futures::StreamExt;
use md5::{Digest, Md5};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::DownloadConfig;
use super::error::{DownloadError, FileOperation, Result};
use super::files::{atomic_rename, create_temp_path, remove_if_exists};
use super::metrics::DownloadMetrics;
use crate::catalog::DownloadLink;

/// HTTP client with integrated download functionality
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    verify_checksums: bool,
}

impl HttpClient {
    /// Create a new HTTP client from download configuration
    pub fn from_config(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            verify_checksums: config.verify_checksums,
        })
    }

    /// Download `link` to `dest_path`, retrying transient failures
    ///
    /// Makes at most `1 + config.max_retries` attempts with a fixed pause in
    /// between. Client errors, integrity failures and cancellation are never
    /// retried.
    pub async fn download_with_retry(
        &self,
        link: &DownloadLink,
        dest_path: &Path,
        credential: &str,
        config: &DownloadConfig,
        metrics: &DownloadMetrics,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let strategy = FixedInterval::new(config.retry_delay).take(config.max_retries);

        let mut attempts = 0usize;
        let result = RetryIf::spawn(
            strategy,
            || {
                attempts += 1;
                if attempts > 1 {
                    metrics.record_retry();
                    debug!("Attempt {} for {}", attempts, link.name);
                }
                self.download_to_file(link, dest_path, credential, cancel)
            },
            |e: &DownloadError| {
                let recoverable = e.is_recoverable() && !cancel.is_cancelled();
                if recoverable {
                    warn!("Transient failure downloading {}: {}", link.name, e);
                }
                recoverable
            },
        )
        .await;

        match result {
            Err(e) if attempts > 1 && e.is_recoverable() => Err(DownloadError::RetriesExhausted {
                url: link.url.clone(),
                attempts,
                source: Box::new(e),
            }),
            other => other,
        }
    }

    /// Make one attempt at downloading `link` to `dest_path`
    ///
    /// Any partial file is removed before an error is returned.
    pub async fn download_to_file(
        &self,
        link: &DownloadLink,
        dest_path: &Path,
        credential: &str,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        if cancel.is_cancelled() {
            return Err(cancelled(link));
        }

        let temp_path = create_temp_path(dest_path);

        let written = match self.stream_to_file(link, &temp_path, credential, cancel).await {
            Ok(written) => written,
            Err(e) => {
                remove_if_exists(&temp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = atomic_rename(&temp_path, dest_path).await {
            remove_if_exists(&temp_path).await;
            return Err(e);
        }

        debug!("Downloaded {} ({} bytes)", link.name, written);
        Ok(written)
    }

    async fn stream_to_file(
        &self,
        link: &DownloadLink,
        temp_path: &Path,
        credential: &str,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let auth = HeaderValue::from_str(&format!("Token {}", credential)).map_err(|_| DownloadError::Configuration {
            message: "API token contains characters not allowed in an HTTP header".to_string(),
        })?;

        let request = self.client.get(&link.url).header(AUTHORIZATION, auth).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(link)),
            response = request => response.map_err(|e| DownloadError::from_reqwest(&link.url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: link.url.clone(),
                status,
            });
        }

        let expected_size = response.content_length();
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| DownloadError::file_system(temp_path, FileOperation::Create, e))?;

        let mut hasher = Md5::new();
        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Let any buffered write land before the caller removes the file
                    let _ = file.flush().await;
                    return Err(cancelled(link));
                }
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };

            let chunk = chunk.map_err(|e| DownloadError::from_reqwest(&link.url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::file_system(temp_path, FileOperation::Write, e))?;
            hasher.update(&chunk);
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::file_system(temp_path, FileOperation::Write, e))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::file_system(temp_path, FileOperation::Write, e))?;
        drop(file);

        if let Some(expected) = expected_size {
            if expected != written {
                return Err(DownloadError::SizeMismatch {
                    file: link.name.clone().into(),
                    expected,
                    actual: written,
                });
            }
        }

        if self.verify_checksums {
            if let Some(expected) = link.md5.as_deref() {
                let actual = hex::encode(hasher.finalize());
                if actual != expected {
                    return Err(DownloadError::ChecksumMismatch {
                        file: link.name.clone().into(),
                        expected: expected.to_string(),
                        actual,
                    });
                }
                debug!("MD5 verified for {}", link.name);
            }
        }

        Ok(written)
    }
}

fn cancelled(link: &DownloadLink) -> DownloadError {
    DownloadError::Cancelled {
        file_name: link.name.clone(),
    }
}
