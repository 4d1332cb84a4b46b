//! Transparency log entries as claimed by a signed entity.
//!
//! A [`TlogEntry`] is an immutable value extracted from a bundle by an
//! external parser. [`TlogEntry::from_rekor_parts`] builds one from the raw
//! pieces a Rekor record carries (canonicalized body, integrated time, log
//! index, log id, SET), decoding the signature and certificate from a
//! `hashedrekord` body.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::EntityError;

/// Supported `hashedrekord` body version.
pub const HASHEDREKORD_API_VERSION: &str = "0.0.1";

const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Certificate embedded in a log entry (DER).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self { der: der.into() }
    }

    /// Decode a PEM `CERTIFICATE` block.
    pub fn from_pem(pem: &[u8]) -> Result<Self, EntityError> {
        let (label, der) = pem_rfc7468::decode_vec(pem)
            .map_err(|e| EntityError::new("certificate", format!("invalid PEM: {}", e)))?;

        if label != PEM_CERTIFICATE_LABEL {
            return Err(EntityError::new(
                "certificate",
                format!("unexpected PEM label: {}", label),
            ));
        }

        Ok(Self { der })
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }
}

/// One claimed transparency log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlogEntry {
    log_key_id: Vec<u8>,
    log_index: i64,
    /// Unix seconds
    integrated_time: i64,
    canonicalized_body: Vec<u8>,
    signed_entry_timestamp: Option<Vec<u8>>,
    signature: Vec<u8>,
    certificate: Certificate,
}

impl TlogEntry {
    /// Create an entry from already-decoded parts.
    pub fn new(
        log_key_id: impl Into<Vec<u8>>,
        log_index: i64,
        integrated_time: i64,
        canonicalized_body: impl Into<Vec<u8>>,
        signature: impl Into<Vec<u8>>,
        certificate: Certificate,
    ) -> Self {
        Self {
            log_key_id: log_key_id.into(),
            log_index,
            integrated_time,
            canonicalized_body: canonicalized_body.into(),
            signed_entry_timestamp: None,
            signature: signature.into(),
            certificate,
        }
    }

    /// Attach the signed entry timestamp (inclusion promise).
    pub fn with_signed_entry_timestamp(mut self, set: impl Into<Vec<u8>>) -> Self {
        self.signed_entry_timestamp = Some(set.into());
        self
    }

    /// Build an entry from Rekor record fields.
    ///
    /// `body_b64` is the Base64 canonicalized body, `log_id_hex` the hex log
    /// id and `set_b64` the Base64 signed entry timestamp. Signature and
    /// certificate are taken from the `hashedrekord` body.
    pub fn from_rekor_parts(
        body_b64: &str,
        integrated_time: i64,
        log_index: i64,
        log_id_hex: &str,
        set_b64: Option<&str>,
    ) -> Result<Self, EntityError> {
        let body = BASE64
            .decode(body_b64)
            .map_err(|e| EntityError::new("tlog_entries", format!("invalid base64 body: {}", e)))?;

        let log_key_id = hex::decode(log_id_hex)
            .map_err(|e| EntityError::new("tlog_entries", format!("invalid log id: {}", e)))?;

        let (signature, certificate) = parse_hashedrekord(&body)?;

        let mut entry = Self::new(
            log_key_id,
            log_index,
            integrated_time,
            body,
            signature,
            certificate,
        );

        if let Some(set_b64) = set_b64 {
            let set = BASE64.decode(set_b64).map_err(|e| {
                EntityError::new(
                    "tlog_entries",
                    format!("invalid base64 signed entry timestamp: {}", e),
                )
            })?;
            entry = entry.with_signed_entry_timestamp(set);
        }

        Ok(entry)
    }

    pub fn log_key_id(&self) -> &[u8] {
        &self.log_key_id
    }

    /// Canonical hex form of the log key id.
    pub fn log_key_id_hex(&self) -> String {
        hex::encode(&self.log_key_id)
    }

    pub fn log_index(&self) -> i64 {
        self.log_index
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Time the log recorded the entry.
    pub fn integrated_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.integrated_time, 0).unwrap_or_default()
    }

    pub fn integrated_time_unix(&self) -> i64 {
        self.integrated_time
    }

    pub fn canonicalized_body(&self) -> &[u8] {
        &self.canonicalized_body
    }

    pub fn signed_entry_timestamp(&self) -> Option<&[u8]> {
        self.signed_entry_timestamp.as_deref()
    }

    /// First structural defect, if any.
    pub(crate) fn structural_defect(&self) -> Option<String> {
        if self.log_key_id.is_empty() {
            return Some("missing log key id".to_string());
        }
        if self.log_index < 0 {
            return Some(format!("negative log index {}", self.log_index));
        }
        if self.integrated_time <= 0 {
            return Some(format!("invalid integrated time {}", self.integrated_time));
        }
        if DateTime::from_timestamp(self.integrated_time, 0).is_none() {
            return Some(format!(
                "integrated time {} out of range",
                self.integrated_time
            ));
        }
        if self.canonicalized_body.is_empty() {
            return Some("missing canonicalized body".to_string());
        }
        if self.signature.is_empty() {
            return Some("missing signature".to_string());
        }
        if self.certificate.is_empty() {
            return Some("missing certificate".to_string());
        }
        if matches!(&self.signed_entry_timestamp, Some(set) if set.is_empty()) {
            return Some("empty signed entry timestamp".to_string());
        }
        None
    }
}

#[derive(Debug, Deserialize)]
struct RekorBody {
    #[serde(rename = "apiVersion")]
    api_version: String,
    kind: String,
    spec: HashedRekordSpec,
}

#[derive(Debug, Deserialize)]
struct HashedRekordSpec {
    signature: HashedRekordSignature,
}

#[derive(Debug, Deserialize)]
struct HashedRekordSignature {
    content: String,
    #[serde(rename = "publicKey")]
    public_key: HashedRekordPublicKey,
}

#[derive(Debug, Deserialize)]
struct HashedRekordPublicKey {
    content: String,
}

fn parse_hashedrekord(body: &[u8]) -> Result<(Vec<u8>, Certificate), EntityError> {
    let parsed: RekorBody = serde_json::from_slice(body)
        .map_err(|e| EntityError::new("tlog_entries", format!("invalid entry body: {}", e)))?;

    if parsed.kind != "hashedrekord" || parsed.api_version != HASHEDREKORD_API_VERSION {
        return Err(EntityError::new(
            "tlog_entries",
            format!(
                "unsupported entry type: {} {}",
                parsed.kind, parsed.api_version
            ),
        ));
    }

    let signature = BASE64
        .decode(&parsed.spec.signature.content)
        .map_err(|e| EntityError::new("tlog_entries", format!("invalid base64 signature: {}", e)))?;

    let cert_bytes = BASE64
        .decode(&parsed.spec.signature.public_key.content)
        .map_err(|e| {
            EntityError::new("tlog_entries", format!("invalid base64 certificate: {}", e))
        })?;

    let certificate = if cert_bytes.starts_with(b"-----BEGIN") {
        Certificate::from_pem(&cert_bytes)?
    } else {
        Certificate::from_der(cert_bytes)
    };

    Ok((signature, certificate))
}
