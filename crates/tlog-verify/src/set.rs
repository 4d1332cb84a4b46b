//! Signed entry timestamp payload.
//!
//! A log operator signs the RFC 8785 canonical JSON of
//! `{"body", "integratedTime", "logID", "logIndex"}` when it accepts an entry.
//! `body` is the Base64 canonicalized body and `logID` the hex log id.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

use crate::entry::TlogEntry;

#[derive(Serialize)]
struct RekorPayload<'a> {
    body: &'a str,
    #[serde(rename = "integratedTime")]
    integrated_time: i64,
    #[serde(rename = "logIndex")]
    log_index: i64,
    #[serde(rename = "logID")]
    log_id: &'a str,
}

/// Canonical bytes covered by a signed entry timestamp.
pub fn set_payload(
    body_b64: &str,
    integrated_time: i64,
    log_index: i64,
    log_id_hex: &str,
) -> Result<Vec<u8>, serde_json::Error> {
    serde_jcs::to_vec(&RekorPayload {
        body: body_b64,
        integrated_time,
        log_index,
        log_id: log_id_hex,
    })
}

/// Canonical SET bytes for a claimed entry.
pub fn entry_set_payload(entry: &TlogEntry) -> Result<Vec<u8>, serde_json::Error> {
    let body = BASE64.encode(entry.canonicalized_body());
    set_payload(
        &body,
        entry.integrated_time_unix(),
        entry.log_index(),
        &entry.log_key_id_hex(),
    )
}
