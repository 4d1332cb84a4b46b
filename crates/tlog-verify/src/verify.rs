//! Transparency log verification of signed entities.
//!
//! An [`ArtifactTlogVerifier`] decides whether a signed entity is backed by
//! enough valid log entries:
//!
//! 1. The entity must carry at least `threshold` entries
//! 2. Each entry must be structurally sound
//! 3. Each entry must be proven accepted by a log, either offline (signed entry
//!    timestamp against the trusted root) or online (re-fetched from the log)
//! 4. Each entry's signature and certificate must match the entity's own, and
//!    its integrated time must fall inside the certificate's validity
//!
//! The strategy is fixed when the verifier is built. Online verification never
//! falls back to offline.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::entity::SignedEntity;
use crate::error::{VerificationError, VerifyResult};
use crate::resolver::LogResolver;
use crate::trust::{TlogVerifier, TrustedRoot};
use crate::types::{VerifierConfig, VerifierMode};
use crate::verify_internal::{policy, OnlineStrategy, Strategy};

/// Verifies transparency log evidence for signed entities.
///
/// Holds no per-call state; `verify` may be called repeatedly and
/// concurrently.
#[derive(Debug)]
pub struct ArtifactTlogVerifier {
    pub(crate) trusted_root: Arc<TrustedRoot>,
    pub(crate) threshold: usize,
    pub(crate) strategy: Strategy,
    pub(crate) concurrency: usize,
}

impl ArtifactTlogVerifier {
    /// Offline verifier: entries must carry signed entry timestamps that some
    /// log in `trusted_root` signed.
    pub fn offline(trusted_root: impl Into<Arc<TrustedRoot>>, threshold: usize) -> Self {
        Self {
            trusted_root: trusted_root.into(),
            threshold,
            strategy: Strategy::Offline,
            concurrency: 1,
        }
    }

    /// Online verifier: entries are re-fetched from the log their key id
    /// names in `tlog_verifiers`, resolved through `resolver`.
    pub fn online(
        trusted_root: impl Into<Arc<TrustedRoot>>,
        threshold: usize,
        tlog_verifiers: BTreeMap<String, TlogVerifier>,
        resolver: Arc<dyn LogResolver>,
    ) -> Self {
        Self {
            trusted_root: trusted_root.into(),
            threshold,
            strategy: Strategy::Online(OnlineStrategy {
                tlog_verifiers: normalize_log_ids(tlog_verifiers),
                resolver,
                query_timeout: VerifierConfig::default().query_timeout(),
            }),
            concurrency: 1,
        }
    }

    pub fn builder(trusted_root: impl Into<Arc<TrustedRoot>>) -> VerifierBuilder {
        VerifierBuilder::new(trusted_root)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn mode(&self) -> VerifierMode {
        match self.strategy {
            Strategy::Offline => VerifierMode::Offline,
            Strategy::Online(_) => VerifierMode::Online,
        }
    }

    pub fn trusted_root(&self) -> &TrustedRoot {
        &self.trusted_root
    }

    /// Verify `entity`'s transparency log evidence.
    ///
    /// Succeeds only if the entity has at least `threshold` entries and every
    /// entry passes. The error names the first failing entry in entity order.
    pub async fn verify(&self, entity: &dyn SignedEntity) -> VerifyResult<()> {
        policy::verify_entity_impl(self, entity).await
    }
}

/// Builder for [`ArtifactTlogVerifier`].
pub struct VerifierBuilder {
    trusted_root: Arc<TrustedRoot>,
    threshold: usize,
    mode: VerifierMode,
    tlog_verifiers: Option<BTreeMap<String, TlogVerifier>>,
    resolver: Option<Arc<dyn LogResolver>>,
    query_timeout: Duration,
    concurrency: usize,
}

impl fmt::Debug for VerifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierBuilder")
            .field("threshold", &self.threshold)
            .field("mode", &self.mode)
            .field("resolver", &self.resolver.is_some())
            .field("query_timeout", &self.query_timeout)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl VerifierBuilder {
    pub fn new(trusted_root: impl Into<Arc<TrustedRoot>>) -> Self {
        Self::from_config(trusted_root, &VerifierConfig::default())
    }

    /// Start from a [`VerifierConfig`] (threshold, mode, timeout, concurrency).
    pub fn from_config(trusted_root: impl Into<Arc<TrustedRoot>>, config: &VerifierConfig) -> Self {
        Self {
            trusted_root: trusted_root.into(),
            threshold: config.threshold,
            mode: config.mode,
            tlog_verifiers: None,
            resolver: None,
            query_timeout: config.query_timeout(),
            concurrency: config.concurrency,
        }
    }

    pub fn threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn mode(mut self, mode: VerifierMode) -> Self {
        self.mode = mode;
        self
    }

    /// Logs consulted in online mode. Defaults to the trusted root's logs.
    pub fn tlog_verifiers(mut self, tlog_verifiers: BTreeMap<String, TlogVerifier>) -> Self {
        self.tlog_verifiers = Some(tlog_verifiers);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn LogResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Bound on each online log query.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Entries verified at once. Failures are still reported in entry order.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn build(self) -> VerifyResult<ArtifactTlogVerifier> {
        if self.concurrency == 0 {
            return Err(VerificationError::Config {
                message: "concurrency must be at least 1".to_string(),
            });
        }

        let strategy = match self.mode {
            VerifierMode::Offline => Strategy::Offline,
            VerifierMode::Online => {
                let resolver = self.resolver.ok_or_else(|| VerificationError::Config {
                    message: "online verification requires a log resolver".to_string(),
                })?;

                if self.query_timeout.is_zero() {
                    return Err(VerificationError::Config {
                        message: "query timeout must be non-zero".to_string(),
                    });
                }

                let tlog_verifiers = self
                    .tlog_verifiers
                    .unwrap_or_else(|| self.trusted_root.tlog_verifiers().clone());

                Strategy::Online(OnlineStrategy {
                    tlog_verifiers: normalize_log_ids(tlog_verifiers),
                    resolver,
                    query_timeout: self.query_timeout,
                })
            }
        };

        Ok(ArtifactTlogVerifier {
            trusted_root: self.trusted_root,
            threshold: self.threshold,
            strategy,
            concurrency: self.concurrency,
        })
    }
}

fn normalize_log_ids(tlog_verifiers: BTreeMap<String, TlogVerifier>) -> BTreeMap<String, TlogVerifier> {
    tlog_verifiers
        .into_iter()
        .map(|(log_id, tlog)| (log_id.to_ascii_lowercase(), tlog))
        .collect()
}
