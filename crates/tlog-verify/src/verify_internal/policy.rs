//! Verify orchestration/policy boundary.
//!
//! Contract:
//! - threshold before any entity content beyond the entries is read
//! - every entry must pass; the first failure in entry order is reported
//! - no crypto or network details (see offline.rs / online.rs)

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::entity::{SignedEntity, VerificationContent};
use crate::entry::TlogEntry;
use crate::error::{VerificationError, VerifyResult};
use crate::trust::TrustedRoot;
use crate::verify::ArtifactTlogVerifier;

use super::checks::{check_against_entity, check_structure};
use super::offline::verify_set_impl;
use super::Strategy;

pub(crate) fn check_threshold(found: usize, required: usize) -> VerifyResult<()> {
    if found < required {
        return Err(VerificationError::InsufficientEvidence { found, required });
    }
    Ok(())
}

/// What every entry is checked against.
struct EntryContext<'a> {
    trusted_root: &'a TrustedRoot,
    strategy: &'a Strategy,
    entity_signature: &'a [u8],
    content: &'a dyn VerificationContent,
}

pub(crate) async fn verify_entity_impl(
    verifier: &ArtifactTlogVerifier,
    entity: &dyn SignedEntity,
) -> VerifyResult<()> {
    let entries = entity.tlog_entries()?;
    check_threshold(entries.len(), verifier.threshold)?;

    let signature_content = entity.signature_content()?;
    let content = entity.verification_content()?;

    debug!(
        entries = entries.len(),
        threshold = verifier.threshold,
        strategy = verifier.strategy.name(),
        concurrency = verifier.concurrency,
        "verifying transparency log entries"
    );

    let ctx = EntryContext {
        trusted_root: &verifier.trusted_root,
        strategy: &verifier.strategy,
        entity_signature: signature_content.signature(),
        content,
    };

    if verifier.concurrency <= 1 {
        for (index, entry) in entries.iter().enumerate() {
            verify_entry_impl(&ctx, index, entry).await?;
        }
    } else {
        // `buffered` yields in input order, so the lowest failing index wins.
        let mut results = stream::iter(entries.iter().enumerate())
            .map(|(index, entry)| verify_entry_impl(&ctx, index, entry))
            .buffered(verifier.concurrency);

        while let Some(result) = results.next().await {
            result?;
        }
    }

    Ok(())
}

async fn verify_entry_impl(
    ctx: &EntryContext<'_>,
    index: usize,
    entry: &TlogEntry,
) -> VerifyResult<()> {
    check_structure(index, entry)?;

    match ctx.strategy {
        Strategy::Offline => verify_set_impl(index, entry, ctx.trusted_root)?,
        Strategy::Online(online) => online.verify_entry_impl(index, entry).await?,
    }

    check_against_entity(index, entry, ctx.entity_signature, ctx.content)
}
