//! Log resolution collaborator.
//!
//! Online verification never talks to a log directly. It asks a
//! [`LogResolver`] for a handle to the log at a base URL and that log's current
//! public key, then queries the handle by log index. [`crate::RekorClient`] is
//! the HTTP implementation; tests inject fakes.
//!
//! Handles are scoped to one verification call and are never cached by the
//! verifier. Caching, if wanted, belongs in the resolver.

use std::fmt;

use async_trait::async_trait;

use crate::error::LogClientResult;
use crate::trust::LogPublicKey;
use crate::types::RemoteLogEntry;

/// Query capability for one resolved log.
#[async_trait]
pub trait LogHandle: Send + Sync {
    /// Every entry the log returns for `log_index`.
    async fn find_by_index(&self, log_index: i64) -> LogClientResult<Vec<RemoteLogEntry>>;
}

/// A log handle with the public key it was resolved with.
pub struct ResolvedLog {
    pub handle: Box<dyn LogHandle>,
    pub public_key: LogPublicKey,
}

impl fmt::Debug for ResolvedLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedLog")
            .field("public_key", &self.public_key.algorithm())
            .finish_non_exhaustive()
    }
}

/// Produces query handles for logs by base URL.
#[async_trait]
pub trait LogResolver: Send + Sync {
    async fn resolve(&self, base_url: &str) -> LogClientResult<ResolvedLog>;
}
