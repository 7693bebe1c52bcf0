//! Download counters
//!
//! Atomic so concurrent transfers can record without locking.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DownloadMetrics {
    pub total_bytes: AtomicU64,
    pub started_downloads: AtomicU64,
    pub successful_downloads: AtomicU64,
    pub failed_downloads: AtomicU64,
    pub cancelled_downloads: AtomicU64,
    pub retries_attempted: AtomicU64,
}

impl DownloadMetrics {
    pub fn record_download_started(&self) {
        self.started_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download_completed(&self, size: u64) {
        self.successful_downloads.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_download_failed(&self) {
        self.failed_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download_cancelled(&self) {
        self.cancelled_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries_attempted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> DownloadMetricsSnapshot {
        DownloadMetricsSnapshot {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            started_downloads: self.started_downloads.load(Ordering::Relaxed),
            successful_downloads: self.successful_downloads.load(Ordering::Relaxed),
            failed_downloads: self.failed_downloads.load(Ordering::Relaxed),
            cancelled_downloads: self.cancelled_downloads.load(Ordering::Relaxed),
            retries_attempted: self.retries_attempted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadMetricsSnapshot {
    pub total_bytes: u64,
    pub started_downloads: u64,
    pub successful_downloads: u64,
    pub failed_downloads: u64,
    pub cancelled_downloads: u64,
    pub retries_attempted: u64,
}

impl std::fmt::Display for DownloadMetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} started, {} completed ({} bytes), {} failed, {} cancelled, {} retries",
            self.started_downloads,
            self.successful_downloads,
            self.total_bytes,
            self.failed_downloads,
            self.cancelled_downloads,
            self.retries_attempted
        )
    }
}
