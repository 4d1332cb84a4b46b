//! Checks shared by both strategies.

use crate::entity::VerificationContent;
use crate::entry::TlogEntry;
use crate::error::{VerificationError, VerifyResult};

/// Reject entries that cannot be meaningfully verified.
pub(crate) fn check_structure(index: usize, entry: &TlogEntry) -> VerifyResult<()> {
    match entry.structural_defect() {
        Some(reason) => Err(VerificationError::MalformedEntry { index, reason }),
        None => Ok(()),
    }
}

/// Cross-check an entry against the entity's own signature and identity.
///
/// Order is fixed: signature, certificate, then time.
pub(crate) fn check_against_entity(
    index: usize,
    entry: &TlogEntry,
    entity_signature: &[u8],
    content: &dyn VerificationContent,
) -> VerifyResult<()> {
    if entry.signature() != entity_signature {
        return Err(VerificationError::SignatureMismatch { index });
    }

    if !content.compare_key(entry.certificate()) {
        return Err(VerificationError::CertificateMismatch { index });
    }

    let integrated_time = entry.integrated_time();
    if !content.valid_at(integrated_time) {
        return Err(VerificationError::TimeOutOfRange {
            index,
            integrated_time,
        });
    }

    Ok(())
}
