//! Transparency log verification for signed artifacts.
//!
//! Decides whether a signed entity is backed by enough valid transparency log
//! evidence before the artifact is trusted:
//!
//! - Threshold (n-of-m) policy over the entity's log entries
//! - Offline verification of signed entry timestamps against a trusted root
//! - Online verification by re-fetching entries from their logs
//! - Cross-checks of each entry against the entity's signature, certificate
//!   and certificate validity window
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tlog_verify::{ArtifactTlogVerifier, EvidenceBundle, RekorClient, TrustedRoot};
//!
//! # async fn example(root: TrustedRoot, bundle: EvidenceBundle) -> anyhow::Result<()> {
//! // Offline: signed entry timestamps only, no network
//! let verifier = ArtifactTlogVerifier::offline(root.clone(), 1);
//! verifier.verify(&bundle).await?;
//!
//! // Online: re-fetch every entry from its log
//! let client = RekorClient::from_env()?;
//! let tlogs = root.tlog_verifiers().clone();
//! let verifier = ArtifactTlogVerifier::online(root, 1, tlogs, Arc::new(client));
//! verifier.verify(&bundle).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `TLOG_VERIFY_THRESHOLD` | Minimum log entries (default: 1) |
//! | `TLOG_VERIFY_MODE` | `offline` or `online` (default: `offline`) |
//! | `TLOG_VERIFY_QUERY_TIMEOUT` | Online query timeout in seconds (default: 30) |
//! | `TLOG_VERIFY_CONCURRENCY` | Entries verified at once (default: 1) |
//! | `TLOG_CLIENT_TIMEOUT` | HTTP request timeout in seconds (default: 30) |
//! | `TLOG_CLIENT_MAX_RETRIES` | Max retries for transient failures (default: 3) |

pub mod checkpoint;
pub mod client;
mod digest;
pub mod entity;
pub mod entry;
pub mod error;
pub mod merkle;
pub mod resolver;
pub mod set;
pub mod trust;
pub mod types;
pub mod verify;
mod verify_internal;

// Re-export main types
pub use checkpoint::{Checkpoint, CheckpointError};
pub use client::{RekorClient, RekorLogHandle};
pub use entity::{
    EvidenceBundle, MessageSignature, PinnedCertificate, SignatureContent, SignedEntity,
    VerificationContent,
};
pub use entry::{Certificate, TlogEntry, HASHEDREKORD_API_VERSION};
pub use error::{
    EntityError, ErrorKind, KeyError, LogClientError, LogClientResult, VerificationError,
    VerifyResult,
};
pub use merkle::InclusionProofError;
pub use resolver::{LogHandle, LogResolver, ResolvedLog};
pub use trust::{LogPublicKey, TlogVerifier, TrustedRoot};
pub use types::{
    InclusionProofData, LogClientConfig, RemoteLogEntry, RemoteVerification, VerifierConfig,
    VerifierMode,
};
pub use verify::{ArtifactTlogVerifier, VerifierBuilder};
