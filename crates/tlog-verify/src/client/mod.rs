//! HTTP client for Rekor-compatible transparency logs.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::{LogClientError, LogClientResult};
use crate::resolver::{LogHandle, LogResolver, ResolvedLog};
use crate::trust::LogPublicKey;
use crate::types::{LogClientConfig, RemoteLogEntry};

mod helpers;
mod http;

use helpers::{api_url, flatten_entries, PUBLIC_KEY_PATH, RETRIEVE_PATH};
use http::HttpBackend;

const USER_AGENT_VALUE: &str = concat!("tlog-verify/", env!("CARGO_PKG_VERSION"));

/// Resolves Rekor logs over HTTP.
///
/// Resolution fetches the log's current public key; the returned handle
/// retrieves entries by log index.
#[derive(Debug, Clone)]
pub struct RekorClient {
    http: HttpBackend,
}

impl RekorClient {
    pub fn new(config: LogClientConfig) -> LogClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| LogClientError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend { client, config },
        })
    }

    pub fn from_env() -> LogClientResult<Self> {
        Self::new(LogClientConfig::from_env())
    }

    /// Fetch the PEM public key currently served by the log at `base_url`.
    pub async fn public_key(&self, base_url: &str) -> LogClientResult<LogPublicKey> {
        let url = api_url(base_url, PUBLIC_KEY_PATH)?;
        debug!(url = %url, "fetching log public key");

        let pem = self.http.get_text(&url).await?;
        Ok(LogPublicKey::from_pem(&pem)?)
    }

    /// Handle for querying the log at `base_url`, without fetching its key.
    pub fn log(&self, base_url: &str) -> LogClientResult<RekorLogHandle> {
        Ok(RekorLogHandle {
            http: self.http.clone(),
            retrieve_url: api_url(base_url, RETRIEVE_PATH)?,
        })
    }
}

#[async_trait]
impl LogResolver for RekorClient {
    async fn resolve(&self, base_url: &str) -> LogClientResult<ResolvedLog> {
        let handle = self.log(base_url)?;
        let public_key = self.public_key(base_url).await?;

        Ok(ResolvedLog {
            handle: Box::new(handle),
            public_key,
        })
    }
}

/// Query handle for one Rekor log.
#[derive(Debug, Clone)]
pub struct RekorLogHandle {
    http: HttpBackend,
    retrieve_url: String,
}

#[async_trait]
impl LogHandle for RekorLogHandle {
    async fn find_by_index(&self, log_index: i64) -> LogClientResult<Vec<RemoteLogEntry>> {
        debug!(url = %self.retrieve_url, log_index, "retrieving log entry");

        let body = serde_json::json!({ "logIndexes": [log_index] });
        let response: Vec<BTreeMap<String, RemoteLogEntry>> =
            match self.http.post_json(&self.retrieve_url, &body).await {
                Ok(response) => response,
                // Some deployments answer 404 for an unknown index.
                Err(LogClientError::NotFound { .. }) => Vec::new(),
                Err(e) => return Err(e),
            };

        Ok(flatten_entries(response))
    }
}
