//! Online strategy: re-fetch each entry from its log.
//!
//! The log is located through the configured verifier mapping, resolved to a
//! query handle plus its current public key, and queried by log index. The
//! fetched entry must verify under that key and agree with the local claim.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::entry::TlogEntry;
use crate::error::{LogClientError, VerificationError, VerifyResult};
use crate::merkle::{leaf_hash, verify_inclusion};
use crate::resolver::LogResolver;
use crate::set::set_payload;
use crate::trust::{LogPublicKey, TlogVerifier};
use crate::types::{InclusionProofData, RemoteLogEntry};

pub(crate) struct OnlineStrategy {
    /// Keyed by lowercase hex log id.
    pub(crate) tlog_verifiers: BTreeMap<String, TlogVerifier>,
    pub(crate) resolver: Arc<dyn LogResolver>,
    pub(crate) query_timeout: Duration,
}

impl fmt::Debug for OnlineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnlineStrategy")
            .field("tlog_verifiers", &self.tlog_verifiers.keys().collect::<Vec<_>>())
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

impl OnlineStrategy {
    pub(crate) async fn verify_entry_impl(&self, index: usize, entry: &TlogEntry) -> VerifyResult<()> {
        let log_id = entry.log_key_id_hex();
        let tlog = self.tlog_verifiers.get(&log_id).ok_or_else(|| {
            VerificationError::UnknownLogIdentifier {
                index,
                log_id: log_id.clone(),
            }
        })?;

        debug!(index, log_id = %log_id, url = %tlog.base_url(), "resolving transparency log");

        let resolved = self.resolver.resolve(tlog.base_url()).await.map_err(|source| {
            VerificationError::LogUnavailable {
                index,
                base_url: tlog.base_url().to_string(),
                source,
            }
        })?;

        let log_index = entry.log_index();
        let found = match tokio::time::timeout(
            self.query_timeout,
            resolved.handle.find_by_index(log_index),
        )
        .await
        {
            Ok(Ok(found)) => found,
            Ok(Err(source)) => {
                return Err(VerificationError::LogQueryFailed {
                    index,
                    log_index,
                    source,
                })
            }
            Err(_) => {
                return Err(VerificationError::LogQueryFailed {
                    index,
                    log_index,
                    source: LogClientError::Timeout {
                        after: self.query_timeout,
                    },
                })
            }
        };

        let remote = match found.as_slice() {
            [] => return Err(VerificationError::LogEntryNotFound { index, log_index }),
            [remote] => remote,
            _ => {
                return Err(VerificationError::AmbiguousLogEntry {
                    index,
                    log_index,
                    count: found.len(),
                })
            }
        };

        verify_remote_entry_impl(entry, remote, &resolved.public_key)
            .map_err(|reason| VerificationError::LogEntryVerificationFailed { index, reason })?;

        debug!(index, log_index, "log entry verified against live log");
        Ok(())
    }
}

/// Verify a fetched entry under the log's key and against the local claim.
pub(crate) fn verify_remote_entry_impl(
    local: &TlogEntry,
    remote: &RemoteLogEntry,
    public_key: &LogPublicKey,
) -> Result<(), String> {
    if remote.log_index != local.log_index() {
        return Err(format!(
            "log returned index {} for requested index {}",
            remote.log_index,
            local.log_index()
        ));
    }

    let local_log_id = local.log_key_id_hex();
    if !remote.log_id.eq_ignore_ascii_case(&local_log_id) {
        return Err(format!(
            "log id {} does not match claimed log id {}",
            remote.log_id, local_log_id
        ));
    }

    if remote.integrated_time != local.integrated_time_unix() {
        return Err(format!(
            "integrated time {} does not match claimed time {}",
            remote.integrated_time,
            local.integrated_time_unix()
        ));
    }

    let body = BASE64
        .decode(&remote.body)
        .map_err(|e| format!("invalid base64 body: {}", e))?;
    if body != local.canonicalized_body() {
        return Err("logged body does not match claimed body".to_string());
    }

    let verification = remote
        .verification
        .as_ref()
        .ok_or_else(|| "log entry carries no verification data".to_string())?;

    let set_b64 = verification
        .signed_entry_timestamp
        .as_deref()
        .ok_or_else(|| "log entry carries no signed entry timestamp".to_string())?;
    let set = BASE64
        .decode(set_b64)
        .map_err(|e| format!("invalid base64 signed entry timestamp: {}", e))?;

    let payload = set_payload(
        &remote.body,
        remote.integrated_time,
        remote.log_index,
        &remote.log_id,
    )
    .map_err(|e| format!("failed to canonicalize entry payload: {}", e))?;

    public_key
        .verify(&payload, &set)
        .map_err(|e| format!("signed entry timestamp rejected by log key: {}", e))?;

    if let Some(proof) = &verification.inclusion_proof {
        check_inclusion_proof(&body, proof, public_key)?;
    }

    Ok(())
}

/// The proof's root must be the root of a checkpoint signed by the log.
fn check_inclusion_proof(
    body: &[u8],
    proof: &InclusionProofData,
    public_key: &LogPublicKey,
) -> Result<(), String> {
    let index = u64::try_from(proof.log_index)
        .map_err(|_| format!("negative inclusion proof index {}", proof.log_index))?;
    let tree_size = u64::try_from(proof.tree_size)
        .map_err(|_| format!("negative tree size {}", proof.tree_size))?;

    let root = decode_hash(&proof.root_hash)?;
    let hashes = proof
        .hashes
        .iter()
        .map(|h| decode_hash(h))
        .collect::<Result<Vec<_>, _>>()?;

    let envelope = proof
        .checkpoint
        .as_deref()
        .ok_or_else(|| "inclusion proof carries no checkpoint".to_string())?;
    let checkpoint = Checkpoint::from_text(envelope).map_err(|e| e.to_string())?;
    checkpoint
        .check_tree(tree_size, &root)
        .map_err(|e| e.to_string())?;
    checkpoint.verify(public_key).map_err(|e| e.to_string())?;

    verify_inclusion(index, tree_size, &leaf_hash(body), &hashes, &root)
        .map_err(|e| format!("inclusion proof: {}", e))
}

fn decode_hash(value: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(value).map_err(|e| format!("invalid hex hash {}: {}", value, e))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| format!("hash has {} bytes, expected 32", bytes.len()))
}
