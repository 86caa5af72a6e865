//! Typed configuration loaded from a TOML file.
//!
//! Required keys are validated eagerly at load time so a misconfigured run
//! fails with a clear [`ConfigError`] before any network activity.
//!
//! Recognized layout:
//!
//! ```toml
//! [api]
//! username = "100000"
//! password = "secret"
//! base_url = "https://voip.ms/api/v1"   # optional
//!
//! [paths]
//! download_dir = "recordings"
//! state_file = "downloaded_recordings.json"
//!
//! [sync]                                 # optional section
//! file_extension = "mp3"
//! list_timeout_secs = 10
//! download_timeout_secs = 30
//! max_attempts = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::retry::DEFAULT_MAX_ATTEMPTS;

/// Default API base URL when `[api] base_url` is omitted.
pub const DEFAULT_BASE_URL: &str = "https://voip.ms/api/v1";

/// Default extension appended to downloaded recording filenames.
pub const DEFAULT_FILE_EXTENSION: &str = "mp3";

/// Default timeout for the inventory listing request.
pub const DEFAULT_LIST_TIMEOUT_SECS: u64 = 10;

/// Default timeout for a single recording download.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// API credentials passed to every remote request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: Url,
    pub download_dir: PathBuf,
    pub state_file: PathBuf,
    pub file_extension: String,
    pub list_timeout: Duration,
    pub download_timeout: Duration,
    pub max_attempts: u32,
}

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal: the process must not touch the network with an
/// incomplete configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML.
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A required key is absent.
    #[error("missing required key `{key}` in section [{section}]")]
    Missing {
        section: &'static str,
        key: &'static str,
    },

    /// `[api] base_url` is not a usable HTTP(S) URL.
    #[error("invalid base_url `{value}`: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

/// Raw deserialized file shape. Everything is optional here; requiredness
/// is enforced in [`Config::from_file`] so missing keys produce a named
/// [`ConfigError::Missing`] instead of a serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api: ApiSection,
    paths: PathsSection,
    sync: SyncSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiSection {
    username: Option<String>,
    password: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathsSection {
    download_dir: Option<PathBuf>,
    state_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SyncSection {
    file_extension: Option<String>,
    list_timeout_secs: Option<u64>,
    download_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, a
    /// required key is missing, or the base URL is unusable.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: FileConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(raw)
    }

    fn from_file(raw: FileConfig) -> Result<Self, ConfigError> {
        let username = raw.api.username.ok_or(ConfigError::Missing {
            section: "api",
            key: "username",
        })?;
        let password = raw.api.password.ok_or(ConfigError::Missing {
            section: "api",
            key: "password",
        })?;
        let download_dir = raw.paths.download_dir.ok_or(ConfigError::Missing {
            section: "paths",
            key: "download_dir",
        })?;
        let state_file = raw.paths.state_file.ok_or(ConfigError::Missing {
            section: "paths",
            key: "state_file",
        })?;

        let base_url = parse_base_url(
            raw.api
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
        )?;

        Ok(Self {
            credentials: Credentials { username, password },
            base_url,
            download_dir,
            state_file,
            file_extension: raw
                .sync
                .file_extension
                .unwrap_or_else(|| DEFAULT_FILE_EXTENSION.to_string()),
            list_timeout: Duration::from_secs(
                raw.sync.list_timeout_secs.unwrap_or(DEFAULT_LIST_TIMEOUT_SECS),
            ),
            download_timeout: Duration::from_secs(
                raw.sync
                    .download_timeout_secs
                    .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            ),
            max_attempts: raw.sync.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1),
        })
    }
}

/// Parses and validates the API base URL.
///
/// Rejects URLs that cannot serve as a base for path segments (e.g.
/// `mailto:`), which lets the rest of the crate extend the path without a
/// fallible branch at every call site.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            value: value.to_string(),
            reason: "URL cannot be used as a base for API paths".to_string(),
        });
    }
    Ok(url)
}
