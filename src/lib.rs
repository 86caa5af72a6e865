//! Recsync Core Library
//!
//! This library synchronizes a remote collection of call recordings exposed
//! by a telephony provider's HTTP API with a local directory. One invocation
//! is one *pass*: load local state, fetch the remote inventory, compute the
//! delta, download only the new recordings, and persist the updated state so
//! repeated invocations converge — including after partial failure.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Typed configuration loaded from a TOML file
//! - [`inventory`] - Remote inventory listing with bounded retries
//! - [`download`] - Streaming per-recording download
//! - [`retry`] - Retry policy with exponential backoff
//! - [`state`] - Persistence of the downloaded-id set
//! - [`sync`] - The pass orchestrator composing the above

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod inventory;
pub mod retry;
pub mod state;
pub mod sync;

// Re-export commonly used types
pub use config::{Config, ConfigError, Credentials};
pub use download::{DownloadError, RecordingDownloader};
pub use inventory::{FetchError, InventoryFetcher, Recording, RecordingId};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy, Sleeper, TokioSleeper};
pub use state::{StateError, StateStore};
pub use sync::{PassSummary, SyncError, Syncer};
