//! `data:` URI encoding for stored file content.
//!
//! Records keep the whole file as `data:<type>;base64,<payload>`, the same
//! self-describing form a browser file reader produces. An empty reported
//! type is written as `application/octet-stream`.

use anyhow::{anyhow, bail, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const FALLBACK_TYPE: &str = "application/octet-stream";

/// Encode raw bytes as a base64 data URI.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    let mime = if mime_type.is_empty() {
        FALLBACK_TYPE
    } else {
        mime_type
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a data URI produced by [`encode`].
///
/// Only the base64 form is accepted; records are never written any other way.
pub fn decode(uri: &str) -> Result<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URI has no payload separator"))?;
    let mime_type = match header.strip_suffix(";base64") {
        Some(mime) => mime.to_string(),
        None => bail!("data URI is not base64-encoded"),
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| anyhow!("invalid base64 payload: {}", e))?;
    Ok(DataUri { mime_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_type_prefix() {
        assert_eq!(encode("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    }

    #[test]
    fn empty_type_uses_octet_stream() {
        assert_eq!(encode("", b""), "data:application/octet-stream;base64,");
    }

    #[test]
    fn decode_restores_bytes() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let decoded = decode(&encode("image/png", &bytes)).unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.bytes, bytes);
    }

    #[test]
    fn decode_rejects_malformed() {
        assert!(decode("hello").is_err());
        assert!(decode("data:text/plain,plain").is_err());
        assert!(decode("data:text/plain;base64").is_err());
        assert!(decode("data:text/plain;base64,!!!").is_err());
    }
}
