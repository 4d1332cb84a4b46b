//! Wire types for the Rekor log API and verifier configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Entry returned by a live log query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLogEntry {
    /// Base64 canonicalized body.
    pub body: String,

    /// Unix seconds.
    #[serde(rename = "integratedTime")]
    pub integrated_time: i64,

    /// Hex log id.
    #[serde(rename = "logID")]
    pub log_id: String,

    #[serde(rename = "logIndex")]
    pub log_index: i64,

    #[serde(default)]
    pub verification: Option<RemoteVerification>,
}

/// Proof material attached to a [`RemoteLogEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVerification {
    /// Base64 signed entry timestamp.
    #[serde(rename = "signedEntryTimestamp", default)]
    pub signed_entry_timestamp: Option<String>,

    #[serde(rename = "inclusionProof", default)]
    pub inclusion_proof: Option<InclusionProofData>,
}

/// Merkle inclusion proof as served by the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProofData {
    /// Hex sibling hashes, leaf to root.
    pub hashes: Vec<String>,

    /// Leaf index within the tree (may differ from the global log index).
    #[serde(rename = "logIndex")]
    pub log_index: i64,

    /// Hex root hash.
    #[serde(rename = "rootHash")]
    pub root_hash: String,

    #[serde(rename = "treeSize")]
    pub tree_size: i64,

    /// Signed checkpoint note, if served.
    #[serde(default)]
    pub checkpoint: Option<String>,
}

/// Verification strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierMode {
    /// Check signed entry timestamps against the trusted root.
    #[default]
    Offline,

    /// Re-query each entry from its log.
    Online,
}

impl fmt::Display for VerifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Online => write!(f, "online"),
        }
    }
}

impl FromStr for VerifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(Self::Offline),
            "online" => Ok(Self::Online),
            other => Err(format!("unknown verifier mode: {}", other)),
        }
    }
}

/// Verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Minimum number of log entries.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    #[serde(default)]
    pub mode: VerifierMode,

    /// Per-query timeout in seconds (online mode).
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Entries verified at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_threshold() -> usize {
    1
}

fn default_query_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    1
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            mode: VerifierMode::default(),
            query_timeout_secs: default_query_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

impl VerifierConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TLOG_VERIFY_THRESHOLD` | Minimum log entries (default: 1) |
    /// | `TLOG_VERIFY_MODE` | `offline` or `online` (default: offline) |
    /// | `TLOG_VERIFY_QUERY_TIMEOUT` | Online query timeout in seconds (default: 30) |
    /// | `TLOG_VERIFY_CONCURRENCY` | Entries verified at once (default: 1) |
    pub fn from_env() -> Self {
        Self {
            threshold: std::env::var("TLOG_VERIFY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_threshold),
            mode: std::env::var("TLOG_VERIFY_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            query_timeout_secs: std::env::var("TLOG_VERIFY_QUERY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_query_timeout),
            concurrency: std::env::var("TLOG_VERIFY_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_concurrency),
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_mode(mut self, mode: VerifierMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the online query timeout. Sub-second remainders round up to the
    /// next whole second.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        let partial = u64::from(timeout.subsec_nanos() > 0);
        self.query_timeout_secs = timeout.as_secs().saturating_add(partial);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// HTTP log client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogClientConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_client_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for LogClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_client_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl LogClientConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TLOG_CLIENT_TIMEOUT` | Request timeout in seconds (default: 30) |
    /// | `TLOG_CLIENT_MAX_RETRIES` | Max retries for transient failures (default: 3) |
    pub fn from_env() -> Self {
        Self {
            timeout_secs: std::env::var("TLOG_CLIENT_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_client_timeout),
            max_retries: std::env::var("TLOG_CLIENT_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}
