use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

/// MD5 of a payload in the two encodings an export needs: base64 for the
/// `Content-MD5` header and hex for logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentDigest {
    pub base64: String,
    pub hex: String,
}

impl ContentDigest {
    pub fn compute(payload: &[u8]) -> Self {
        let digest = md5::compute(payload);
        Self {
            base64: STANDARD.encode(digest.0),
            hex: format!("{:x}", digest),
        }
    }
}
