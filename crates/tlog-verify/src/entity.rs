//! Capabilities a signed entity exposes to the verifier.
//!
//! Any concrete bundle format implements [`SignedEntity`]; the verifier only
//! sees the log entries, the entity's own signature and its signing identity.
//! [`EvidenceBundle`] is a ready-made in-memory implementation.

use chrono::{DateTime, Utc};

use crate::entry::{Certificate, TlogEntry};
use crate::error::EntityError;

/// The entity's own claimed signature.
pub trait SignatureContent: Send + Sync {
    fn signature(&self) -> &[u8];
}

/// The entity's own claimed signing identity.
pub trait VerificationContent: Send + Sync {
    /// Whether `certificate` is the entity's signing certificate.
    fn compare_key(&self, certificate: &Certificate) -> bool;

    /// Whether `time` falls inside the signing certificate's validity window.
    fn valid_at(&self, time: DateTime<Utc>) -> bool;
}

/// An artifact-plus-evidence bundle under verification.
pub trait SignedEntity: Send + Sync {
    /// Log entries in bundle order.
    fn tlog_entries(&self) -> Result<Vec<TlogEntry>, EntityError>;

    fn signature_content(&self) -> Result<&dyn SignatureContent, EntityError>;

    fn verification_content(&self) -> Result<&dyn VerificationContent, EntityError>;
}

/// Raw message signature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSignature {
    bytes: Vec<u8>,
}

impl MessageSignature {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl SignatureContent for MessageSignature {
    fn signature(&self) -> &[u8] {
        &self.bytes
    }
}

/// Signing certificate pinned by DER bytes with an inclusive validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedCertificate {
    certificate: Certificate,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl PinnedCertificate {
    pub fn new(
        certificate: Certificate,
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
    ) -> Self {
        Self {
            certificate,
            not_before,
            not_after,
        }
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }
}

impl VerificationContent for PinnedCertificate {
    fn compare_key(&self, certificate: &Certificate) -> bool {
        self.certificate.as_der() == certificate.as_der()
    }

    fn valid_at(&self, time: DateTime<Utc>) -> bool {
        time >= self.not_before && time <= self.not_after
    }
}

/// In-memory signed entity.
#[derive(Debug, Clone)]
pub struct EvidenceBundle {
    entries: Vec<TlogEntry>,
    signature: MessageSignature,
    verification: PinnedCertificate,
}

impl EvidenceBundle {
    pub fn new(
        entries: Vec<TlogEntry>,
        signature: MessageSignature,
        verification: PinnedCertificate,
    ) -> Self {
        Self {
            entries,
            signature,
            verification,
        }
    }

    pub fn entries(&self) -> &[TlogEntry] {
        &self.entries
    }
}

impl SignedEntity for EvidenceBundle {
    fn tlog_entries(&self) -> Result<Vec<TlogEntry>, EntityError> {
        Ok(self.entries.clone())
    }

    fn signature_content(&self) -> Result<&dyn SignatureContent, EntityError> {
        Ok(&self.signature)
    }

    fn verification_content(&self) -> Result<&dyn VerificationContent, EntityError> {
        Ok(&self.verification)
    }
}
