//! Trusted transparency logs.
//!
//! A [`TrustedRoot`] maps log key identifiers to [`TlogVerifier`]s. Each
//! verifier names one log operator: its base URL and its public key. The log
//! key identifier is the lowercase hex SHA-256 of the key's SPKI DER encoding,
//! the same identifier Rekor reports as `logID`.
//!
//! The root is built once by the caller and never mutated during verification.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pkcs8::{DecodePublicKey, EncodePublicKey};

use crate::digest::sha256_hex;
use crate::error::KeyError;

/// Public key of a transparency log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogPublicKey {
    /// ECDSA over P-256 with SHA-256 (Rekor v1).
    EcdsaP256(p256::ecdsa::VerifyingKey),

    /// Ed25519.
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl LogPublicKey {
    /// Decode an SPKI DER public key.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, KeyError> {
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_der(der) {
            return Ok(Self::EcdsaP256(key));
        }

        ed25519_dalek::VerifyingKey::from_public_key_der(der)
            .map(Self::Ed25519)
            .map_err(|e| KeyError::Spki(e.to_string()))
    }

    /// Decode a Base64-encoded SPKI DER public key.
    pub fn from_spki_base64(b64: &str) -> Result<Self, KeyError> {
        let der = BASE64
            .decode(b64.trim())
            .map_err(|e| KeyError::Base64(e.to_string()))?;
        Self::from_spki_der(&der)
    }

    /// Decode a PEM `PUBLIC KEY` block.
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_pem(pem.trim()) {
            return Ok(Self::EcdsaP256(key));
        }

        ed25519_dalek::VerifyingKey::from_public_key_pem(pem.trim())
            .map(Self::Ed25519)
            .map_err(|e| KeyError::Spki(e.to_string()))
    }

    /// SPKI DER encoding.
    pub fn to_spki_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = match self {
            Self::EcdsaP256(key) => key.to_public_key_der(),
            Self::Ed25519(key) => key.to_public_key_der(),
        }
        .map_err(|e| KeyError::Encode(e.to_string()))?;

        Ok(doc.as_bytes().to_vec())
    }

    /// Log key identifier: hex SHA-256 of the SPKI DER encoding.
    pub fn log_id(&self) -> Result<String, KeyError> {
        Ok(sha256_hex(&self.to_spki_der()?))
    }

    /// Algorithm name for diagnostics.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::EcdsaP256(_) => "ecdsa-p256-sha256",
            Self::Ed25519(_) => "ed25519",
        }
    }

    /// Verify `signature` over `message`.
    ///
    /// ECDSA signatures are accepted in ASN.1 DER or fixed-size `r || s` form.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), String> {
        match self {
            Self::EcdsaP256(key) => {
                use p256::ecdsa::signature::Verifier;
                use p256::ecdsa::Signature;

                let sig = Signature::from_der(signature)
                    .or_else(|_| Signature::from_slice(signature))
                    .map_err(|e| format!("invalid ECDSA signature encoding: {}", e))?;

                key.verify(message, &sig)
                    .map_err(|_| "ecdsa verification failed".to_string())
            }
            Self::Ed25519(key) => {
                use ed25519_dalek::{Signature, Verifier};

                let sig = Signature::from_slice(signature)
                    .map_err(|e| format!("invalid signature bytes: {}", e))?;

                key.verify(message, &sig)
                    .map_err(|_| "ed25519 verification failed".to_string())
            }
        }
    }
}

/// One trusted log operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlogVerifier {
    base_url: String,
    log_id: String,
    public_key: LogPublicKey,
}

impl TlogVerifier {
    /// Create a verifier; the log id is derived from the key.
    pub fn new(base_url: impl Into<String>, public_key: LogPublicKey) -> Result<Self, KeyError> {
        let log_id = public_key.log_id()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            log_id,
            public_key,
        })
    }

    /// Create a verifier from a Base64 SPKI public key, checking the claimed id.
    pub fn from_spki_base64(
        base_url: impl Into<String>,
        claimed_log_id: &str,
        public_key_b64: &str,
    ) -> Result<Self, KeyError> {
        let verifier = Self::new(base_url, LogPublicKey::from_spki_base64(public_key_b64)?)?;

        if !verifier.log_id.eq_ignore_ascii_case(claimed_log_id) {
            return Err(KeyError::Spki(format!(
                "log id mismatch: claimed {}, computed {}",
                claimed_log_id, verifier.log_id
            )));
        }

        Ok(verifier)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    pub fn public_key(&self) -> &LogPublicKey {
        &self.public_key
    }
}

/// Statically configured set of trusted log operators.
#[derive(Debug, Clone, Default)]
pub struct TrustedRoot {
    /// Hex log id -> verifier
    tlogs: BTreeMap<String, TlogVerifier>,
}

impl TrustedRoot {
    /// Create an empty trusted root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trusted root from a set of verifiers.
    pub fn with_tlogs(tlogs: impl IntoIterator<Item = TlogVerifier>) -> Self {
        let mut root = Self::new();
        for tlog in tlogs {
            root.add_tlog(tlog);
        }
        root
    }

    /// Add a log; a verifier with the same log id is replaced.
    pub fn add_tlog(&mut self, tlog: TlogVerifier) {
        if let Some(previous) = self.tlogs.insert(tlog.log_id.clone(), tlog) {
            tracing::warn!(
                log_id = %previous.log_id,
                base_url = %previous.base_url,
                "replacing trusted log with same key id"
            );
        }
    }

    /// All trusted logs, keyed by hex log id.
    pub fn tlog_verifiers(&self) -> &BTreeMap<String, TlogVerifier> {
        &self.tlogs
    }

    /// Look up a log by hex log id.
    pub fn get(&self, log_id: &str) -> Option<&TlogVerifier> {
        self.tlogs.get(&log_id.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tlogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tlogs.is_empty()
    }
}
