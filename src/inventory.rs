//! Remote inventory listing with bounded retries.
//!
//! [`InventoryFetcher`] asks the API for the list of available recordings.
//! Transport-level failures (connection errors, timeouts, non-2xx statuses)
//! are retried with exponential backoff up to the configured attempt bound;
//! structural problems in the response body are terminal immediately, since
//! a schema mismatch does not heal with retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Credentials;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Opaque identifier of a remote recording, assigned by the remote system.
///
/// The API serves ids as either JSON strings or integers; both forms
/// deserialize to the same id. Ordering is lexicographic, which is only
/// used to make delta processing deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingId(String);

impl RecordingId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RecordingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = RecordingId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer recording id")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(RecordingId(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(RecordingId(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(RecordingId(value.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// One entry of the remote inventory.
///
/// The API returns more metadata per recording; only the id matters here.
/// Records without an id cannot be tracked and are skipped by the
/// orchestrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub id: Option<RecordingId>,
}

/// Errors raised while listing the remote inventory.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error listing recordings from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout listing recordings from {url}")]
    Timeout { url: String },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} listing recordings from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The response body is not valid JSON.
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The body is valid JSON but does not carry a `recordings` array.
    #[error("unexpected inventory response shape: {reason}")]
    Format { reason: String },
}

impl FetchError {
    pub(crate) fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    pub(crate) fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Whether another attempt in the same pass could plausibly succeed.
    ///
    /// Transport failures are retryable; format and decode failures are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }
}

/// Lists the remote recordings with bounded retries and exponential backoff.
#[derive(Clone)]
pub struct InventoryFetcher {
    client: reqwest::Client,
    base_url: Url,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl InventoryFetcher {
    /// Creates a fetcher with the production (tokio) sleeper.
    ///
    /// `base_url` must be usable as a base for path segments; config
    /// validation guarantees this for URLs that reach here.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(base_url: Url, timeout: Duration, policy: RetryPolicy) -> Self {
        Self::with_sleeper(base_url, timeout, policy, Arc::new(TokioSleeper))
    }

    /// Creates a fetcher with an injected sleeper, for tests that must not
    /// wait out real backoff delays.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_sleeper(
        base_url: Url,
        timeout: Duration,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            base_url,
            policy,
            sleeper,
        }
    }

    /// Fetches the list of available recordings.
    ///
    /// Retries transport failures up to the policy's attempt bound, sleeping
    /// the backoff delay between attempts. The returned error is terminal
    /// for the pass; callers must not retry further.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when every attempt failed at the transport
    /// level, or immediately when the response body is structurally
    /// unexpected.
    pub async fn fetch(&self, credentials: &Credentials) -> Result<Vec<Recording>, FetchError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            match self.fetch_once(credentials).await {
                Ok(recordings) => {
                    info!(count = recordings.len(), "fetched remote inventory");
                    return Ok(recordings);
                }
                Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "inventory fetch failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        error!(
                            attempts = attempt + 1,
                            error = %err,
                            "all inventory fetch attempts failed"
                        );
                    } else {
                        error!(error = %err, "inventory response unusable, not retrying");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// One listing attempt: request, status check, body decode, field check.
    async fn fetch_once(&self, credentials: &Credentials) -> Result<Vec<Recording>, FetchError> {
        // Bare endpoint for logs and errors; credentials travel only in the
        // request's query string.
        let endpoint = self.endpoint(&["recordings"]);
        let mut request_url = endpoint.clone();
        request_url
            .query_pairs_mut()
            .append_pair("username", &credentials.username)
            .append_pair("password", &credentials.password);

        debug!(url = %endpoint, "listing recordings");

        let response = self.client.get(request_url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(endpoint.as_str())
            } else {
                FetchError::network(endpoint.as_str(), e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(endpoint.as_str(), status.as_u16()));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Decode {
                    url: endpoint.to_string(),
                    source: e,
                }
            } else if e.is_timeout() {
                FetchError::timeout(endpoint.as_str())
            } else {
                FetchError::network(endpoint.as_str(), e)
            }
        })?;

        let records = body
            .get("recordings")
            .ok_or_else(|| FetchError::format("missing `recordings` field"))?
            .as_array()
            .ok_or_else(|| FetchError::format("`recordings` is not an array"))?;

        // Elements that are not objects carry no usable id; they surface as
        // id-less records and get skipped by the orchestrator.
        let recordings = records
            .iter()
            .map(|value| {
                serde_json::from_value::<Recording>(value.clone()).unwrap_or_default()
            })
            .collect();

        Ok(recordings)
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
