//! Configuration types for the downloader

use std::time::Duration;

use crate::catalog::client::DEFAULT_USER_AGENT;

/// Number of transfers allowed in flight at once
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// Configuration for download operations
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Size of the worker pool; independent of how many files a release has
    pub max_concurrent: usize,
    /// Extra attempts after the first for transient failures
    pub max_retries: usize,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, body included
    pub timeout: Duration,
    pub user_agent: String,
    /// Compare the catalog MD5 (when trustworthy) against the received bytes
    pub verify_checksums: bool,
}

impl DownloadConfig {
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verify_checksums: true,
        }
    }
}
