//! The pass orchestrator.
//!
//! One call to [`Syncer::run`] is one synchronization pass: load state,
//! fetch the remote inventory, compute the delta, download the new
//! recordings sequentially, and persist the updated state. The pass only
//! aborts when the inventory itself is unavailable — without it there is
//! nothing to reconcile. A failed individual download is logged and
//! skipped; its id stays out of the persisted state so the next pass
//! re-attempts exactly that id.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, Credentials};
use crate::download::RecordingDownloader;
use crate::inventory::{FetchError, InventoryFetcher, RecordingId};
use crate::retry::RetryPolicy;
use crate::state::StateStore;

/// Errors that abort a synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The download directory could not be created.
    #[error("could not create download directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote inventory could not be fetched; the pass has nothing to
    /// reconcile against.
    #[error("could not fetch remote inventory: {source}")]
    Inventory {
        #[source]
        source: FetchError,
    },
}

/// Counts describing what one pass saw and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Recordings listed by the remote inventory (with a usable id).
    pub remote: usize,
    /// Ids in the inventory but not yet in local state.
    pub new: usize,
    /// New ids downloaded successfully this pass.
    pub downloaded: usize,
    /// New ids whose download failed; they remain candidates next pass.
    pub failed: usize,
}

/// Runs synchronization passes against one remote collection.
pub struct Syncer {
    fetcher: InventoryFetcher,
    downloader: RecordingDownloader,
    store: StateStore,
    credentials: Credentials,
    download_dir: PathBuf,
    file_extension: String,
}

impl Syncer {
    /// Builds the pass components from a validated configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let fetcher = InventoryFetcher::new(
            config.base_url.clone(),
            config.list_timeout,
            RetryPolicy::new(config.max_attempts),
        );
        let downloader =
            RecordingDownloader::new(config.base_url.clone(), config.download_timeout);
        Self {
            fetcher,
            downloader,
            store: StateStore::new(&config.state_file),
            credentials: config.credentials.clone(),
            download_dir: config.download_dir.clone(),
            file_extension: config.file_extension.clone(),
        }
    }

    /// Runs one synchronization pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] only when the pass cannot proceed at all: the
    /// download directory cannot be created or the inventory fetch failed
    /// terminally. Individual download failures and a failed state write do
    /// not error; they are logged and reflected in the [`PassSummary`].
    pub async fn run(&self) -> Result<PassSummary, SyncError> {
        std::fs::create_dir_all(&self.download_dir).map_err(|source| SyncError::CreateDir {
            path: self.download_dir.clone(),
            source,
        })?;

        let local = self.store.load();

        // Hard stop on failure: no inventory, nothing to reconcile.
        let remote = self
            .fetcher
            .fetch(&self.credentials)
            .await
            .map_err(|source| SyncError::Inventory { source })?;

        let remote_ids: HashSet<RecordingId> = remote
            .into_iter()
            .filter_map(|recording| {
                if recording.id.is_none() {
                    debug!("skipping inventory record without an id");
                }
                recording.id
            })
            .collect();

        // Sorted for a deterministic download order.
        let mut new_ids: Vec<RecordingId> =
            remote_ids.difference(&local).cloned().collect();
        new_ids.sort();

        let mut summary = PassSummary {
            remote: remote_ids.len(),
            new: new_ids.len(),
            ..PassSummary::default()
        };

        if new_ids.is_empty() {
            // State file is intentionally not rewritten here.
            info!("no new recordings to download, synchronization is complete");
            return Ok(summary);
        }

        info!(count = new_ids.len(), "found new recordings to download");

        let mut succeeded: Vec<RecordingId> = Vec::new();
        for id in &new_ids {
            let dest = self
                .download_dir
                .join(format!("{id}.{}", self.file_extension));
            match self.downloader.download(id, &self.credentials, &dest).await {
                Ok(()) => succeeded.push(id.clone()),
                Err(err) => {
                    warn!(%id, error = %err, "download failed, will retry next pass");
                    summary.failed += 1;
                }
            }
        }
        summary.downloaded = succeeded.len();

        if succeeded.is_empty() {
            // All new downloads failed: leave the state file untouched so
            // every id stays new for the next pass.
            return Ok(summary);
        }

        let mut updated = local;
        updated.extend(succeeded);
        if let Err(err) = self.store.save(&updated) {
            warn!(
                path = %self.store.path().display(),
                error = %err,
                "could not persist state; completed downloads will be re-attempted next pass"
            );
        }

        Ok(summary)
    }
}
