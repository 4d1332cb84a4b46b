//! Error types for transparency log verification.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Fieldless classification of a [`VerificationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InsufficientEvidence,
    MalformedEntry,
    UntrustedLogSignature,
    UnknownLogIdentifier,
    LogUnavailable,
    LogQueryFailed,
    LogEntryNotFound,
    AmbiguousLogEntry,
    LogEntryVerificationFailed,
    SignatureMismatch,
    CertificateMismatch,
    TimeOutOfRange,
    Parse,
    Config,
}

/// Verification errors.
///
/// Every per-entry variant carries `index`, the position of the failing entry
/// in the order exposed by the signed entity.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// Fewer log entries than the configured threshold.
    #[error("not enough transparency log entries: {found} < {required}")]
    InsufficientEvidence { found: usize, required: usize },

    /// Entry is structurally invalid.
    #[error("entry {index}: malformed log entry: {reason}")]
    MalformedEntry { index: usize, reason: String },

    /// No trusted log key validates the signed entry timestamp.
    #[error("entry {index}: signed entry timestamp not valid for any trusted log key")]
    UntrustedLogSignature { index: usize },

    /// Log key id has no configured log.
    #[error("entry {index}: unable to find tlog information for key {log_id}")]
    UnknownLogIdentifier { index: usize, log_id: String },

    /// Log could not be resolved.
    #[error("entry {index}: log at {base_url} unavailable: {source}")]
    LogUnavailable {
        index: usize,
        base_url: String,
        #[source]
        source: LogClientError,
    },

    /// Log query failed or timed out.
    #[error("entry {index}: query for log index {log_index} failed: {source}")]
    LogQueryFailed {
        index: usize,
        log_index: i64,
        #[source]
        source: LogClientError,
    },

    /// Log returned no entry for the index.
    #[error("entry {index}: unable to locate log entry {log_index}")]
    LogEntryNotFound { index: usize, log_index: i64 },

    /// Log returned more than one entry for the index.
    #[error("entry {index}: log returned {count} entries for log index {log_index}")]
    AmbiguousLogEntry {
        index: usize,
        log_index: i64,
        count: usize,
    },

    /// Fetched entry failed verification against the log's key.
    #[error("entry {index}: log entry verification failed: {reason}")]
    LogEntryVerificationFailed { index: usize, reason: String },

    /// Entry signature differs from the entity signature.
    #[error("entry {index}: transparency log signature does not match")]
    SignatureMismatch { index: usize },

    /// Entry certificate differs from the entity certificate.
    #[error("entry {index}: transparency log certificate does not match")]
    CertificateMismatch { index: usize },

    /// Integrated time outside certificate validity.
    #[error("entry {index}: integrated time {integrated_time} outside certificate validity")]
    TimeOutOfRange {
        index: usize,
        integrated_time: DateTime<Utc>,
    },

    /// Signed entity could not provide its content.
    #[error("signed entity could not be read: {0}")]
    Parse(#[from] EntityError),

    /// Verifier configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl VerificationError {
    /// Classification without the diagnostic fields.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientEvidence { .. } => ErrorKind::InsufficientEvidence,
            Self::MalformedEntry { .. } => ErrorKind::MalformedEntry,
            Self::UntrustedLogSignature { .. } => ErrorKind::UntrustedLogSignature,
            Self::UnknownLogIdentifier { .. } => ErrorKind::UnknownLogIdentifier,
            Self::LogUnavailable { .. } => ErrorKind::LogUnavailable,
            Self::LogQueryFailed { .. } => ErrorKind::LogQueryFailed,
            Self::LogEntryNotFound { .. } => ErrorKind::LogEntryNotFound,
            Self::AmbiguousLogEntry { .. } => ErrorKind::AmbiguousLogEntry,
            Self::LogEntryVerificationFailed { .. } => ErrorKind::LogEntryVerificationFailed,
            Self::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
            Self::CertificateMismatch { .. } => ErrorKind::CertificateMismatch,
            Self::TimeOutOfRange { .. } => ErrorKind::TimeOutOfRange,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Position of the failing entry, if the error belongs to one.
    pub fn entry_index(&self) -> Option<usize> {
        match self {
            Self::MalformedEntry { index, .. }
            | Self::UntrustedLogSignature { index }
            | Self::UnknownLogIdentifier { index, .. }
            | Self::LogUnavailable { index, .. }
            | Self::LogQueryFailed { index, .. }
            | Self::LogEntryNotFound { index, .. }
            | Self::AmbiguousLogEntry { index, .. }
            | Self::LogEntryVerificationFailed { index, .. }
            | Self::SignatureMismatch { index }
            | Self::CertificateMismatch { index }
            | Self::TimeOutOfRange { index, .. } => Some(*index),
            Self::InsufficientEvidence { .. } | Self::Parse(_) | Self::Config { .. } => None,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input / config issues
            Self::Parse(_) => 1,
            Self::Config { .. } => 1,

            // Policy
            Self::InsufficientEvidence { .. } => 3,

            // Security issues
            Self::MalformedEntry { .. } => 4,
            Self::UntrustedLogSignature { .. } => 4,
            Self::UnknownLogIdentifier { .. } => 4,
            Self::LogEntryNotFound { .. } => 4,
            Self::AmbiguousLogEntry { .. } => 4,
            Self::LogEntryVerificationFailed { .. } => 4,
            Self::SignatureMismatch { .. } => 4,
            Self::CertificateMismatch { .. } => 4,
            Self::TimeOutOfRange { .. } => 4,

            // Network/transient
            Self::LogUnavailable { .. } => 5,
            Self::LogQueryFailed { .. } => 5,
        }
    }
}

/// Failure of a [`crate::SignedEntity`] capability.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{capability}: {message}")]
pub struct EntityError {
    /// Which capability failed (e.g. `tlog_entries`).
    pub capability: &'static str,

    /// What went wrong.
    pub message: String,
}

impl EntityError {
    pub fn new(capability: &'static str, message: impl Into<String>) -> Self {
        Self {
            capability,
            message: message.into(),
        }
    }
}

/// Public key decoding errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyError {
    #[error("invalid base64 public key: {0}")]
    Base64(String),

    #[error("unsupported or invalid SPKI public key: {0}")]
    Spki(String),

    #[error("failed to encode public key: {0}")]
    Encode(String),
}

/// Errors from the log client collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LogClientError {
    /// Transport failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Request did not complete in time.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    /// Endpoint returned 404.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Response body could not be understood.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Log public key could not be decoded.
    #[error("invalid log public key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Client configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl LogClientError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }
}

impl From<reqwest::Error> for LogClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for verification.
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Result type for log client operations.
pub type LogClientResult<T> = Result<T, LogClientError>;
