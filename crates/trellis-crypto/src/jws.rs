//! Compact JWS handling for `JsonWebSignature2020` style proofs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// JOSE header members relevant to verification.
#[derive(Debug, Clone, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    #[serde(default = "default_b64")]
    pub b64: bool,
    #[serde(default)]
    pub crit: Vec<String>,
}

fn default_b64() -> bool {
    true
}

/// A parsed compact JWS, ready to check against a detached message.
#[derive(Debug, Clone)]
pub struct CompactJws {
    pub header: JwsHeader,
    encoded_header: String,
    payload: Option<String>,
    pub signature: Vec<u8>,
}

impl CompactJws {
    /// Parse `header.payload.signature`, where `payload` may be empty.
    ///
    /// Returns `None` when the token is not well-formed.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (encoded_header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let header_bytes = URL_SAFE_NO_PAD.decode(encoded_header).ok()?;
        let header: JwsHeader = serde_json::from_slice(&header_bytes).ok()?;
        if !header.b64 && !header.crit.iter().any(|c| c == "b64") {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        Some(Self {
            header,
            encoded_header: encoded_header.to_string(),
            payload: (!payload.is_empty()).then(|| payload.to_string()),
            signature,
        })
    }

    /// Bytes the signature must cover when `message` is the secured payload.
    ///
    /// Detached tokens use `message` directly (RFC 7797 when `b64` is false).
    /// Attached tokens must carry exactly `message` as payload.
    pub fn signing_input(&self, message: &[u8]) -> Option<Vec<u8>> {
        let mut input = self.encoded_header.as_bytes().to_vec();
        input.push(b'.');
        match &self.payload {
            None if self.header.b64 => input.extend_from_slice(URL_SAFE_NO_PAD.encode(message).as_bytes()),
            None => input.extend_from_slice(message),
            Some(encoded) => {
                let attached = if self.header.b64 {
                    URL_SAFE_NO_PAD.decode(encoded).ok()?
                } else {
                    encoded.as_bytes().to_vec()
                };
                if attached != message {
                    return None;
                }
                input.extend_from_slice(encoded.as_bytes());
            }
        }
        Some(input)
    }
}

/// Build a detached, unencoded-payload JWS header segment for `alg`.
pub fn detached_header(alg: &str) -> String {
    let header = serde_json::json!({ "alg": alg, "b64": false, "crit": ["b64"] });
    URL_SAFE_NO_PAD.encode(header.to_string())
}
