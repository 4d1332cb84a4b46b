//! Shared fixtures: test logs that sign real SETs, evidence bundles and a
//! recording in-memory resolver.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use p256::ecdsa::signature::Signer;

use tlog_verify::checkpoint::key_hint;
use tlog_verify::merkle::{leaf_hash, node_hash};
use tlog_verify::set::set_payload;
use tlog_verify::{
    Certificate, EvidenceBundle, InclusionProofData, LogClientError, LogClientResult, LogHandle,
    LogPublicKey, LogResolver, MessageSignature, PinnedCertificate, RemoteLogEntry,
    RemoteVerification, ResolvedLog, TlogEntry, TlogVerifier, TrustedRoot,
};

pub const INTEGRATED_TIME: i64 = 1_700_000_000;
pub const ARTIFACT_SIGNATURE: &[u8] = b"artifact-signature";
pub const SIGNING_CERT: &[u8] = b"signing-certificate-der";

/// A log operator with its own P-256 key.
pub struct TestLog {
    pub base_url: String,
    key: p256::ecdsa::SigningKey,
}

impl TestLog {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            key: p256::ecdsa::SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn public_key(&self) -> LogPublicKey {
        LogPublicKey::EcdsaP256(*self.key.verifying_key())
    }

    pub fn public_key_pem(&self) -> String {
        use pkcs8::EncodePublicKey;
        self.key
            .verifying_key()
            .to_public_key_pem(pkcs8::LineEnding::LF)
            .unwrap()
    }

    pub fn log_id(&self) -> String {
        self.public_key().log_id().unwrap()
    }

    pub fn tlog(&self) -> TlogVerifier {
        TlogVerifier::new(self.base_url.clone(), self.public_key()).unwrap()
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        sign_der(&self.key, message)
    }

    /// Checkpoint note for a tree head, signed by this log.
    pub fn checkpoint(&self, tree_size: i64, root_hash: &[u8; 32]) -> String {
        signed_checkpoint(&self.key, tree_size, root_hash)
    }

    /// Record an artifact signature at `log_index`.
    pub fn record(&self, log_index: i64) -> Record {
        self.record_with(log_index, ARTIFACT_SIGNATURE, SIGNING_CERT)
    }

    pub fn record_with(&self, log_index: i64, signature: &[u8], cert_der: &[u8]) -> Record {
        let body = hashedrekord_body(signature, cert_der);
        let body_b64 = BASE64.encode(&body);
        let log_id = self.log_id();
        let payload = set_payload(&body_b64, INTEGRATED_TIME, log_index, &log_id).unwrap();

        Record {
            key: self.key.clone(),
            body,
            body_b64,
            log_id,
            log_index,
            integrated_time: INTEGRATED_TIME,
            set: self.sign(&payload),
        }
    }
}

/// What a log stores for one accepted entry.
#[derive(Clone)]
pub struct Record {
    key: p256::ecdsa::SigningKey,
    pub body: Vec<u8>,
    pub body_b64: String,
    pub log_id: String,
    pub log_index: i64,
    pub integrated_time: i64,
    pub set: Vec<u8>,
}

impl Record {
    /// The entry as a bundle carries it.
    pub fn entry(&self) -> TlogEntry {
        TlogEntry::from_rekor_parts(
            &self.body_b64,
            self.integrated_time,
            self.log_index,
            &self.log_id,
            Some(&BASE64.encode(&self.set)),
        )
        .unwrap()
    }

    /// The entry as the log serves it.
    pub fn remote(&self) -> RemoteLogEntry {
        RemoteLogEntry {
            body: self.body_b64.clone(),
            integrated_time: self.integrated_time,
            log_id: self.log_id.clone(),
            log_index: self.log_index,
            verification: Some(RemoteVerification {
                signed_entry_timestamp: Some(BASE64.encode(&self.set)),
                inclusion_proof: None,
            }),
        }
    }

    /// Root of the two-leaf tree the served proof places this entry in.
    pub fn proof_root(&self) -> [u8; 32] {
        node_hash(&leaf_hash(&self.body), &leaf_hash(b"neighbouring entry"))
    }

    /// Served entry with a proof placing it first in a two-leaf tree, and a
    /// checkpoint for that tree signed by the log.
    pub fn remote_with_proof(&self) -> RemoteLogEntry {
        let checkpoint = signed_checkpoint(&self.key, 2, &self.proof_root());
        self.remote_with_checkpoint(Some(checkpoint))
    }

    /// Served entry with the two-leaf proof and an arbitrary checkpoint.
    pub fn remote_with_checkpoint(&self, checkpoint: Option<String>) -> RemoteLogEntry {
        let mut remote = self.remote();
        if let Some(verification) = remote.verification.as_mut() {
            verification.inclusion_proof = Some(InclusionProofData {
                hashes: vec![hex::encode(leaf_hash(b"neighbouring entry"))],
                log_index: 0,
                root_hash: hex::encode(self.proof_root()),
                tree_size: 2,
                checkpoint,
            });
        }
        remote
    }
}

fn sign_der(key: &p256::ecdsa::SigningKey, message: &[u8]) -> Vec<u8> {
    let sig: p256::ecdsa::Signature = key.sign(message);
    sig.to_der().as_bytes().to_vec()
}

fn signed_checkpoint(
    key: &p256::ecdsa::SigningKey,
    tree_size: i64,
    root_hash: &[u8; 32],
) -> String {
    let public_key = LogPublicKey::EcdsaP256(*key.verifying_key());
    let note = format!(
        "rekor.example - 1\n{}\n{}\n",
        tree_size,
        BASE64.encode(root_hash)
    );
    let mut raw = key_hint(&public_key).unwrap().to_vec();
    raw.extend(sign_der(key, note.as_bytes()));
    format!("{}\n\u{2014} rekor.example {}\n", note, BASE64.encode(raw))
}

pub fn hashedrekord_body(signature: &[u8], cert_der: &[u8]) -> Vec<u8> {
    let cert_pem =
        pem_rfc7468::encode_string("CERTIFICATE", pem_rfc7468::LineEnding::LF, cert_der).unwrap();
    let body = serde_json::json!({
        "apiVersion": "0.0.1",
        "kind": "hashedrekord",
        "spec": {
            "data": {
                "hash": {
                    "algorithm": "sha256",
                    "value": "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
                }
            },
            "signature": {
                "content": BASE64.encode(signature),
                "publicKey": { "content": BASE64.encode(cert_pem) }
            }
        }
    });
    serde_json::to_vec(&body).unwrap()
}

pub fn integrated_time() -> DateTime<Utc> {
    DateTime::from_timestamp(INTEGRATED_TIME, 0).unwrap()
}

/// Bundle whose certificate is valid an hour either side of the fixtures' time.
pub fn bundle(entries: Vec<TlogEntry>) -> EvidenceBundle {
    bundle_with_window(
        entries,
        integrated_time() - chrono::Duration::hours(1),
        integrated_time() + chrono::Duration::hours(1),
    )
}

pub fn bundle_with_window(
    entries: Vec<TlogEntry>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
) -> EvidenceBundle {
    EvidenceBundle::new(
        entries,
        MessageSignature::new(ARTIFACT_SIGNATURE.to_vec()),
        PinnedCertificate::new(
            Certificate::from_der(SIGNING_CERT.to_vec()),
            not_before,
            not_after,
        ),
    )
}

pub fn root(logs: &[&TestLog]) -> TrustedRoot {
    TrustedRoot::with_tlogs(logs.iter().map(|log| log.tlog()))
}

/// In-memory resolver that records every call.
#[derive(Default)]
pub struct FakeResolver {
    logs: HashMap<String, FakeLog>,
    pub resolve_calls: AtomicUsize,
    pub query_calls: Arc<AtomicUsize>,
    queried: Arc<Mutex<Vec<i64>>>,
}

struct FakeLog {
    public_key: LogPublicKey,
    entries: Vec<RemoteLogEntry>,
    delays: HashMap<i64, Duration>,
    query_error: Option<fn() -> LogClientError>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entries` for `log`, under the log's own key.
    pub fn with_log(self, log: &TestLog, entries: Vec<RemoteLogEntry>) -> Self {
        self.with_log_key(&log.base_url, log.public_key(), entries)
    }

    /// Serve `entries` at `base_url` under an arbitrary key.
    pub fn with_log_key(
        mut self,
        base_url: &str,
        public_key: LogPublicKey,
        entries: Vec<RemoteLogEntry>,
    ) -> Self {
        self.logs.insert(
            base_url.to_string(),
            FakeLog {
                public_key,
                entries,
                delays: HashMap::new(),
                query_error: None,
            },
        );
        self
    }

    /// Delay queries for `log_index` at `base_url`.
    pub fn with_delay(mut self, base_url: &str, log_index: i64, delay: Duration) -> Self {
        if let Some(log) = self.logs.get_mut(base_url) {
            log.delays.insert(log_index, delay);
        }
        self
    }

    /// Fail every query at `base_url`.
    pub fn with_query_error(mut self, base_url: &str, error: fn() -> LogClientError) -> Self {
        if let Some(log) = self.logs.get_mut(base_url) {
            log.query_error = Some(error);
        }
        self
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Log indexes queried, in call order.
    pub fn queried(&self) -> Vec<i64> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogResolver for FakeResolver {
    async fn resolve(&self, base_url: &str) -> LogClientResult<ResolvedLog> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        let log = self
            .logs
            .get(base_url)
            .ok_or_else(|| LogClientError::Network {
                message: format!("connection refused: {}", base_url),
            })?;

        Ok(ResolvedLog {
            handle: Box::new(FakeHandle {
                entries: log.entries.clone(),
                delays: log.delays.clone(),
                query_error: log.query_error,
                calls: Arc::clone(&self.query_calls),
                queried: Arc::clone(&self.queried),
            }),
            public_key: log.public_key.clone(),
        })
    }
}

struct FakeHandle {
    entries: Vec<RemoteLogEntry>,
    delays: HashMap<i64, Duration>,
    query_error: Option<fn() -> LogClientError>,
    calls: Arc<AtomicUsize>,
    queried: Arc<Mutex<Vec<i64>>>,
}

#[async_trait]
impl LogHandle for FakeHandle {
    async fn find_by_index(&self, log_index: i64) -> LogClientResult<Vec<RemoteLogEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(log_index);

        if let Some(delay) = self.delays.get(&log_index) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(error) = self.query_error {
            return Err(error());
        }

        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.log_index == log_index)
            .cloned()
            .collect())
    }
}
