//! Pure helpers: URL building, response flattening (no HTTP, no status logic).

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{LogClientError, LogClientResult};
use crate::types::RemoteLogEntry;

/// Rekor public key endpoint.
pub(crate) const PUBLIC_KEY_PATH: &str = "api/v1/log/publicKey";

/// Rekor entry retrieval endpoint.
pub(crate) const RETRIEVE_PATH: &str = "api/v1/log/entries/retrieve";

/// Join an API path onto a log base URL.
///
/// The base URL may carry a path prefix (`https://host/rekor`); it is kept.
pub(crate) fn api_url(base_url: &str, path: &str) -> LogClientResult<String> {
    let mut base = url::Url::parse(base_url).map_err(|e| LogClientError::Config {
        message: format!("invalid log base URL {}: {}", base_url, e),
    })?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(LogClientError::Config {
            message: format!("unsupported log URL scheme: {}", base.scheme()),
        });
    }

    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }

    base.join(path)
        .map(|u| u.to_string())
        .map_err(|e| LogClientError::Config {
            message: format!("invalid log API path {}: {}", path, e),
        })
}

/// Flatten a retrieve response (`[{uuid: entry}, ...]`) into its entries.
///
/// Entries within one object are ordered by UUID so results are stable.
pub(crate) fn flatten_entries(response: Vec<BTreeMap<String, RemoteLogEntry>>) -> Vec<RemoteLogEntry> {
    response
        .into_iter()
        .flat_map(|by_uuid| by_uuid.into_values())
        .collect()
}

/// Parse a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Longest wait between retries.
pub(crate) const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff ceiling for the `retry`-th retry (1-based), capped at
/// [`MAX_BACKOFF`].
pub(crate) fn backoff_ceiling(retry: u32) -> Duration {
    // 2^5 already exceeds the cap
    Duration::from_secs(1u64 << retry.min(5)).min(MAX_BACKOFF)
}
