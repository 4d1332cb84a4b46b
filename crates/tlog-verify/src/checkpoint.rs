//! Signed tree heads (checkpoints) in the signed note format.
//!
//! ```text
//! <origin>
//! <tree size>
//! <base64 root hash>
//! [extension lines]
//!
//! \u{2014} <signer name> <base64(key hint || signature)>
//! ```
//!
//! The signed message is the note text up to and including the newline that
//! precedes the blank line. The key hint is the first four bytes of the log id.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::trust::LogPublicKey;

const SIGNATURE_PREFIX: &str = "\u{2014} ";
const KEY_HINT_LEN: usize = 4;

/// Checkpoint parsing and verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckpointError {
    #[error("malformed checkpoint: {0}")]
    Malformed(String),

    #[error("checkpoint tree size {checkpoint} does not match proof tree size {proof}")]
    TreeSizeMismatch { checkpoint: u64, proof: u64 },

    #[error("checkpoint root hash {checkpoint} does not match proof root hash {proof}")]
    RootHashMismatch { checkpoint: String, proof: String },

    #[error("no checkpoint signature from log key {key_hint}")]
    NoMatchingSignature { key_hint: String },

    #[error("checkpoint signature rejected by log key: {0}")]
    BadSignature(String),
}

/// One signature line of a signed note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSignature {
    pub name: String,
    pub key_hint: [u8; KEY_HINT_LEN],
    pub signature: Vec<u8>,
}

/// A parsed checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub origin: String,
    pub tree_size: u64,
    pub root_hash: [u8; 32],
    pub extensions: Vec<String>,
    pub signatures: Vec<CheckpointSignature>,
    signed_text: String,
}

impl Checkpoint {
    /// Parse a signed note envelope.
    pub fn from_text(envelope: &str) -> Result<Self, CheckpointError> {
        let split = envelope
            .find("\n\n")
            .ok_or_else(|| malformed("missing blank line before signatures"))?;
        let signed_text = &envelope[..split + 1];
        let signature_block = &envelope[split + 2..];

        let mut lines = signed_text.lines();
        let origin = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| malformed("missing origin"))?
            .to_string();
        let tree_size = lines
            .next()
            .ok_or_else(|| malformed("missing tree size"))?
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid tree size: {}", e)))?;
        let root_b64 = lines.next().ok_or_else(|| malformed("missing root hash"))?;
        let root_bytes = BASE64
            .decode(root_b64)
            .map_err(|e| malformed(format!("invalid root hash encoding: {}", e)))?;
        let root_hash = <[u8; 32]>::try_from(root_bytes.as_slice())
            .map_err(|_| malformed(format!("root hash has {} bytes, expected 32", root_bytes.len())))?;
        let extensions = lines.map(str::to_string).collect();

        let signatures = signature_block
            .lines()
            .filter(|line| !line.is_empty())
            .map(parse_signature_line)
            .collect::<Result<Vec<_>, _>>()?;
        if signatures.is_empty() {
            return Err(malformed("no signatures"));
        }

        Ok(Self {
            origin,
            tree_size,
            root_hash,
            extensions,
            signatures,
            signed_text: signed_text.to_string(),
        })
    }

    /// Bytes covered by the note signatures.
    pub fn signed_data(&self) -> &[u8] {
        self.signed_text.as_bytes()
    }

    /// Require a signature from `public_key` over this checkpoint.
    ///
    /// Only signature lines whose key hint matches the key are considered;
    /// every one of them must verify.
    pub fn verify(&self, public_key: &LogPublicKey) -> Result<(), CheckpointError> {
        let key_hint = key_hint(public_key)?;

        let mut matched = false;
        for sig in self.signatures.iter().filter(|sig| sig.key_hint == key_hint) {
            public_key
                .verify(self.signed_data(), &sig.signature)
                .map_err(CheckpointError::BadSignature)?;
            matched = true;
        }

        if matched {
            Ok(())
        } else {
            Err(CheckpointError::NoMatchingSignature {
                key_hint: hex::encode(key_hint),
            })
        }
    }

    /// Require this checkpoint to describe the tree a proof was computed against.
    pub fn check_tree(&self, tree_size: u64, root_hash: &[u8; 32]) -> Result<(), CheckpointError> {
        if self.tree_size != tree_size {
            return Err(CheckpointError::TreeSizeMismatch {
                checkpoint: self.tree_size,
                proof: tree_size,
            });
        }
        if &self.root_hash != root_hash {
            return Err(CheckpointError::RootHashMismatch {
                checkpoint: hex::encode(self.root_hash),
                proof: hex::encode(root_hash),
            });
        }
        Ok(())
    }
}

/// First four bytes of the log id (SHA-256 of the SPKI DER).
pub fn key_hint(public_key: &LogPublicKey) -> Result<[u8; KEY_HINT_LEN], CheckpointError> {
    let log_id = public_key
        .log_id()
        .map_err(|e| CheckpointError::BadSignature(e.to_string()))?;
    let bytes = hex::decode(&log_id).map_err(|e| malformed(e.to_string()))?;
    let mut hint = [0u8; KEY_HINT_LEN];
    hint.copy_from_slice(&bytes[..KEY_HINT_LEN]);
    Ok(hint)
}

fn parse_signature_line(line: &str) -> Result<CheckpointSignature, CheckpointError> {
    let rest = line
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| malformed("signature line missing prefix"))?;
    let (name, sig_b64) = rest
        .rsplit_once(' ')
        .ok_or_else(|| malformed("signature line missing signer name"))?;
    if name.is_empty() {
        return Err(malformed("empty signer name"));
    }

    let raw = BASE64
        .decode(sig_b64)
        .map_err(|e| malformed(format!("invalid signature encoding: {}", e)))?;
    if raw.len() <= KEY_HINT_LEN {
        return Err(malformed("signature too short"));
    }

    let mut key_hint = [0u8; KEY_HINT_LEN];
    key_hint.copy_from_slice(&raw[..KEY_HINT_LEN]);

    Ok(CheckpointSignature {
        name: name.to_string(),
        key_hint,
        signature: raw[KEY_HINT_LEN..].to_vec(),
    })
}

fn malformed(reason: impl Into<String>) -> CheckpointError {
    CheckpointError::Malformed(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer;

    fn signed_note(key: &p256::ecdsa::SigningKey, body: &str) -> String {
        let public_key = LogPublicKey::EcdsaP256(*key.verifying_key());
        let sig: p256::ecdsa::Signature = key.sign(body.as_bytes());
        let mut raw = key_hint(&public_key).unwrap().to_vec();
        raw.extend_from_slice(sig.to_der().as_bytes());
        format!("{}\n{}rekor.example {}\n", body, SIGNATURE_PREFIX, BASE64.encode(raw))
    }

    fn body(tree_size: u64, root: &[u8; 32]) -> String {
        format!("rekor.example - 1234\n{}\n{}\n", tree_size, BASE64.encode(root))
    }

    #[test]
    fn test_parse_and_verify() {
        let key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let note = signed_note(&key, &body(42, &[7u8; 32]));

        let checkpoint = Checkpoint::from_text(&note).unwrap();
        assert_eq!(checkpoint.origin, "rekor.example - 1234");
        assert_eq!(checkpoint.tree_size, 42);
        assert_eq!(checkpoint.root_hash, [7u8; 32]);
        assert_eq!(checkpoint.signatures.len(), 1);
        assert_eq!(checkpoint.signatures[0].name, "rekor.example");
        assert_eq!(checkpoint.signed_data(), body(42, &[7u8; 32]).as_bytes());

        checkpoint
            .verify(&LogPublicKey::EcdsaP256(*key.verifying_key()))
            .unwrap();
        checkpoint.check_tree(42, &[7u8; 32]).unwrap();
    }

    #[test]
    fn test_extension_lines_are_signed() {
        let key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let text = format!("{}Timestamp: 1700000000\n", body(3, &[1u8; 32]));
        let checkpoint = Checkpoint::from_text(&signed_note(&key, &text)).unwrap();

        assert_eq!(checkpoint.extensions, vec!["Timestamp: 1700000000".to_string()]);
        checkpoint
            .verify(&LogPublicKey::EcdsaP256(*key.verifying_key()))
            .unwrap();
    }

    #[test]
    fn test_other_key_has_no_signature() {
        let key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let other = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let checkpoint = Checkpoint::from_text(&signed_note(&key, &body(1, &[0u8; 32]))).unwrap();

        let err = checkpoint
            .verify(&LogPublicKey::EcdsaP256(*other.verifying_key()))
            .unwrap_err();
        assert!(matches!(err, CheckpointError::NoMatchingSignature { .. }));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let note = signed_note(&key, &body(10, &[2u8; 32])).replacen("\n10\n", "\n11\n", 1);
        let checkpoint = Checkpoint::from_text(&note).unwrap();

        let err = checkpoint
            .verify(&LogPublicKey::EcdsaP256(*key.verifying_key()))
            .unwrap_err();
        assert!(matches!(err, CheckpointError::BadSignature(_)));
    }

    #[test]
    fn test_tree_mismatch() {
        let key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let checkpoint = Checkpoint::from_text(&signed_note(&key, &body(5, &[3u8; 32]))).unwrap();

        assert!(matches!(
            checkpoint.check_tree(6, &[3u8; 32]),
            Err(CheckpointError::TreeSizeMismatch { checkpoint: 5, proof: 6 })
        ));
        assert!(matches!(
            checkpoint.check_tree(5, &[4u8; 32]),
            Err(CheckpointError::RootHashMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_notes() {
        for note in [
            "",
            "origin\n2\nAAAA\n",
            "origin\n2\nAAAA\n\n\u{2014} attacker sig\n",
            "origin\nnot-a-number\nAAAA\n\n\u{2014} a AAAAAAAA\n",
            "\n\n",
        ] {
            assert!(
                matches!(Checkpoint::from_text(note), Err(CheckpointError::Malformed(_))),
                "accepted {:?}",
                note
            );
        }
    }
}
