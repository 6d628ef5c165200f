//! Upstream response envelope.
//!
//! Every upstream body is wrapped as `{"Response": ..., "Code": ..., "Message": ...}`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GalleryError, Result};

#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Response")]
    pub response: Option<Value>,
    #[serde(rename = "Code", default)]
    pub code: Option<u16>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

/// Decodes a success body and returns its `Response` payload.
///
/// Bytes that are not a JSON envelope at all are a transport-level failure
/// (retryable); a well-formed envelope without a payload is not.
pub fn unwrap_body(body: &[u8]) -> Result<Value> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| GalleryError::Transport(format!("unreadable response body: {e}")))?;

    envelope.response.ok_or_else(|| {
        GalleryError::MalformedPayload(format!(
            "envelope without Response (Code {}, Message {:?})",
            envelope.code.map_or_else(|| "-".to_string(), |c| c.to_string()),
            envelope.message.unwrap_or_default()
        ))
    })
}

/// First `limit` characters of a body, for error diagnostics.
pub fn truncate_body(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
