//! Offline strategy: signed entry timestamp against the trusted root.
//!
//! No I/O. The entry is accepted if any trusted log key validates its SET.

use tracing::{debug, warn};

use crate::entry::TlogEntry;
use crate::error::{VerificationError, VerifyResult};
use crate::set::entry_set_payload;
use crate::trust::TrustedRoot;

pub(crate) fn verify_set_impl(
    index: usize,
    entry: &TlogEntry,
    trusted_root: &TrustedRoot,
) -> VerifyResult<()> {
    let set = entry
        .signed_entry_timestamp()
        .ok_or_else(|| VerificationError::MalformedEntry {
            index,
            reason: "missing signed entry timestamp".to_string(),
        })?;

    let payload = entry_set_payload(entry).map_err(|e| VerificationError::MalformedEntry {
        index,
        reason: format!("failed to canonicalize entry payload: {}", e),
    })?;

    let signer = trusted_root
        .tlog_verifiers()
        .values()
        .find(|tlog| tlog.public_key().verify(&payload, set).is_ok());

    match signer {
        Some(tlog) => {
            debug!(index, log_id = %tlog.log_id(), "signed entry timestamp verified");
            Ok(())
        }
        None => {
            warn!(
                index,
                claimed_log_id = %entry.log_key_id_hex(),
                trusted_logs = trusted_root.len(),
                "signed entry timestamp not valid for any trusted log"
            );
            Err(VerificationError::UntrustedLogSignature { index })
        }
    }
}
