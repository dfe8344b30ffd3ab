//! The opaque continuation-token cursor.
//!
//! A truncated list page hands the client a base64-encoded JSON triple. The
//! client treats it as opaque; the proxy decodes it strictly on the next
//! call. A tampered or truncated token is a client error (400), never a
//! crash and never a silent reset of pagination.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use shardbucket_core::ProxyError;

/// The decoded continuation token: where the previous page ended.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cursor {
    /// The physical bucket holding the last emitted key.
    pub bucket: String,
    /// The last key emitted on the previous page.
    pub key: String,
    /// Absolute position of the next entry in the merged ordering.
    pub position: usize,
}

impl Cursor {
    /// Encode the cursor as an opaque token.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing a flat struct of strings and an integer cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization is infallible");
        BASE64.encode(json)
    }

    /// Decode a client-supplied token.
    ///
    /// Decoding is strict: unknown fields, missing fields, invalid JSON, and
    /// invalid base64 are all rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::BadRequest`] for any malformed token.
    pub fn decode(token: &str) -> Result<Self, ProxyError> {
        let bytes = BASE64
            .decode(token)
            .map_err(|_| ProxyError::BadRequest("invalid continuation token".to_owned()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| ProxyError::BadRequest("invalid continuation token".to_owned()))
    }
}
