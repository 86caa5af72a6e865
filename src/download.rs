//! Streaming download of individual recordings.
//!
//! [`RecordingDownloader`] fetches one recording body and writes it to disk
//! incrementally through a buffered writer, so memory use is independent of
//! the recording size. There is no retry at this level: a failed id stays
//! out of the persisted state and is re-attempted on the next pass, which
//! keeps one pass's duration bounded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};
use url::Url;

use crate::config::Credentials;
use crate::inventory::RecordingId;

/// Errors that can occur while downloading a single recording.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error downloading recording {id}: {source}")]
    Network {
        id: RecordingId,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading recording {id}")]
    Timeout { id: RecordingId },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading recording {id}")]
    HttpStatus { id: RecordingId, status: u16 },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    fn network(id: &RecordingId, source: reqwest::Error) -> Self {
        Self::Network {
            id: id.clone(),
            source,
        }
    }

    fn timeout(id: &RecordingId) -> Self {
        Self::Timeout { id: id.clone() }
    }

    fn http_status(id: &RecordingId, status: u16) -> Self {
        Self::HttpStatus {
            id: id.clone(),
            status,
        }
    }

    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Streams individual recordings to local files.
///
/// Designed to be created once per pass and reused for every download,
/// taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct RecordingDownloader {
    client: reqwest::Client,
    base_url: Url,
}

impl RecordingDownloader {
    /// Creates a downloader with its own client and (larger) timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, base_url }
    }

    /// Downloads one recording to `dest`, creating or overwriting the file.
    ///
    /// On a mid-stream failure the partial file is removed, so a failed
    /// download never leaves truncated data behind.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on any transport failure, non-2xx status,
    /// or file system error. None of these are retried here; the id simply
    /// stays new for the next pass.
    pub async fn download(
        &self,
        id: &RecordingId,
        credentials: &Credentials,
        dest: &Path,
    ) -> Result<(), DownloadError> {
        let mut request_url = self.endpoint(&["recordings", id.as_str(), "file"]);
        request_url
            .query_pairs_mut()
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password);

        debug!(%id, path = %dest.display(), "starting download");

        let response = self.client.get(request_url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(id)
            } else {
                DownloadError::network(id, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(id, status.as_u16()));
        }

        let file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let result = stream_to_file(file, response, id, dest).await;

        if result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes_written = result?;

        info!(%id, path = %dest.display(), bytes = bytes_written, "download complete");
        Ok(())
    }

    /// Extends the base URL path with the given segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Infallible for http(s) base URLs, which config validation enforces.
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Streams the response body to the file in chunks, returning bytes written.
///
/// Extracted so the caller can clean up the partial file on error.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    id: &RecordingId,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(id)
            } else {
                DownloadError::network(id, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    Ok(bytes_written)
}
