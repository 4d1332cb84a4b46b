//! RFC 6962 Merkle tree inclusion proofs.
//!
//! Leaf hash: `SHA-256(0x00 || leaf)`. Interior node: `SHA-256(0x01 || left || right)`.
//! The audit path is ordered from the leaf towards the root.

use sha2::{Digest, Sha256};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Inclusion proof failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InclusionProofError {
    #[error("leaf index {index} out of range for tree size {tree_size}")]
    IndexOutOfRange { index: u64, tree_size: u64 },

    #[error("wrong proof length: expected {expected} hashes, got {actual}")]
    WrongProofLength { expected: usize, actual: usize },

    #[error("computed root {computed} does not match expected root {expected}")]
    RootMismatch { computed: String, expected: String },
}

pub fn leaf_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(data);
    finalize(hasher)
}

pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    finalize(hasher)
}

fn finalize(hasher: Sha256) -> [u8; 32] {
    let digest = hasher.finalize();
    let mut out = [0_u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Verify that `leaf` sits at `index` in a tree of `tree_size` leaves with `root`.
pub fn verify_inclusion(
    index: u64,
    tree_size: u64,
    leaf: &[u8; 32],
    proof: &[[u8; 32]],
    root: &[u8; 32],
) -> Result<(), InclusionProofError> {
    if index >= tree_size {
        return Err(InclusionProofError::IndexOutOfRange { index, tree_size });
    }

    // Levels below the point where the paths to `index` and the last leaf
    // diverge; above it the path only climbs the right border.
    let inner = (u64::BITS - (index ^ (tree_size - 1)).leading_zeros()) as usize;
    let border = (index >> inner).count_ones() as usize;

    if proof.len() != inner + border {
        return Err(InclusionProofError::WrongProofLength {
            expected: inner + border,
            actual: proof.len(),
        });
    }

    let mut computed = *leaf;
    for (level, sibling) in proof[..inner].iter().enumerate() {
        computed = if (index >> level) & 1 == 0 {
            node_hash(&computed, sibling)
        } else {
            node_hash(sibling, &computed)
        };
    }
    for sibling in &proof[inner..] {
        computed = node_hash(sibling, &computed);
    }

    if &computed != root {
        return Err(InclusionProofError::RootMismatch {
            computed: hex::encode(computed),
            expected: hex::encode(root),
        });
    }

    Ok(())
}
