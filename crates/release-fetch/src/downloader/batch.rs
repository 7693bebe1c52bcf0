//! Fail-fast batch downloads over a bounded worker pool

use futures::stream::{self, StreamExt};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::config::DownloadConfig;
use super::error::{DownloadError, Result};
use super::files::remove_download;
use super::http::HttpClient;
use super::metrics::DownloadMetrics;
use super::{DownloadOutcome, DownloadResult};
use crate::catalog::DownloadLink;

/// Download every link into `dest_dir`, at most `config.max_concurrent` at a time
///
/// The first failure cancels every other transfer. Once all in-flight work has
/// settled, every file of the batch is removed and that single failure is
/// returned together with the per-file outcomes. Results are in the order of
/// `links`.
pub(crate) async fn download_batch(
    http: &HttpClient,
    config: &DownloadConfig,
    metrics: &DownloadMetrics,
    dest_dir: &Path,
    links: &[DownloadLink],
    credential: &str,
) -> Result<Vec<DownloadResult>> {
    let cancel = CancellationToken::new();
    let max_concurrent = config.max_concurrent.max(1);

    let mut transfers = stream::iter(links.iter().enumerate())
        .map(|(index, link)| {
            let cancel = cancel.clone();
            async move {
                let (result, error) = download_one(http, config, metrics, dest_dir, link, credential, &cancel)
                    .instrument(info_span!("download", file = %link.name))
                    .await;
                (index, result, error)
            }
        })
        .buffer_unordered(max_concurrent);

    let mut results: Vec<(usize, DownloadResult)> = Vec::with_capacity(links.len());
    let mut first_failure: Option<(String, DownloadError)> = None;

    while let Some((index, result, error)) = transfers.next().await {
        match error {
            None | Some(DownloadError::Cancelled { .. }) => {}
            Some(e) if first_failure.is_none() => {
                warn!("Download of {} failed, cancelling remaining transfers: {}", result.file_name, e);
                cancel.cancel();
                first_failure = Some((result.file_name.clone(), e));
            }
            Some(e) => debug!("Download of {} also failed after abort: {}", result.file_name, e),
        }
        results.push((index, result));
    }
    drop(transfers);

    results.sort_by_key(|(index, _)| *index);
    let results: Vec<DownloadResult> = results.into_iter().map(|(_, result)| result).collect();

    if let Some((file_name, source)) = first_failure {
        // Every transfer has returned, so no worker can recreate a path behind this sweep
        for link in links {
            remove_download(&dest_dir.join(&link.name)).await;
        }

        let cancelled = results
            .iter()
            .filter(|r| r.outcome == DownloadOutcome::Cancelled)
            .count();

        return Err(DownloadError::BatchAborted {
            file_name,
            cancelled,
            results,
            source: Box::new(source),
        });
    }

    info!("Downloaded {} files into {}", results.len(), dest_dir.display());
    Ok(results)
}

async fn download_one(
    http: &HttpClient,
    config: &DownloadConfig,
    metrics: &DownloadMetrics,
    dest_dir: &Path,
    link: &DownloadLink,
    credential: &str,
    cancel: &CancellationToken,
) -> (DownloadResult, Option<DownloadError>) {
    let dest_path = dest_dir.join(&link.name);

    if cancel.is_cancelled() {
        metrics.record_download_cancelled();
        return (
            DownloadResult::new(link, dest_path, 0, DownloadOutcome::Cancelled),
            Some(DownloadError::Cancelled {
                file_name: link.name.clone(),
            }),
        );
    }

    metrics.record_download_started();
    debug!("Starting download of {}", link.url);

    match http
        .download_with_retry(link, &dest_path, credential, config, metrics, cancel)
        .await
    {
        Ok(written) => {
            metrics.record_download_completed(written);
            (
                DownloadResult::new(link, dest_path, written, DownloadOutcome::Downloaded),
                None,
            )
        }
        Err(e @ DownloadError::Cancelled { .. }) => {
            metrics.record_download_cancelled();
            (DownloadResult::new(link, dest_path, 0, DownloadOutcome::Cancelled), Some(e))
        }
        Err(e) => {
            metrics.record_download_failed();
            (
                DownloadResult::new(link, dest_path, 0, DownloadOutcome::Failed(e.to_string())),
                Some(e),
            )
        }
    }
}
