//! Opaque-blob protection.
//!
//! Opaque credentials (authorization codes, refresh tokens, and access
//! tokens without a JWS handler) are serialized tickets run through a
//! [`DataFormat`]. The default format is AES-256-GCM keyed from server
//! secrets; hosts may plug in their own (e.g. a KMS-backed envelope).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::error::JoseError;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size (128 bits / 16 bytes).
const TAG_SIZE: usize = 16;

/// Symmetric codec for opaque credential payloads.
///
/// `unprotect` returns `None` on any failure (encoding, framing, MAC); a
/// tampered or foreign blob is indistinguishable from an unknown one.
pub trait DataFormat: Send + Sync {
    /// Protect a payload into an opaque, URL-safe string.
    fn protect(&self, payload: &[u8]) -> Result<String, JoseError>;

    /// Recover the payload from a protected blob, or `None` if the blob is
    /// invalid in any way.
    fn unprotect(&self, blob: &str) -> Option<Vec<u8>>;
}

/// Default authenticated-encryption format.
///
/// Output layout: `base64url_nopad(nonce || ciphertext || tag)` with a
/// fresh random nonce per call.
pub struct AesGcmDataFormat {
    cipher: Aes256Gcm,
}

impl AesGcmDataFormat {
    /// Create a format keyed with a 32-byte secret.
    pub fn new(key: &[u8]) -> Result<Self, JoseError> {
        if key.len() != 32 {
            return Err(JoseError::InvalidKey(format!(
                "Invalid key length: expected 32 bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| JoseError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }
}

impl DataFormat for AesGcmDataFormat {
    fn protect(&self, payload: &[u8]) -> Result<String, JoseError> {
        // SECURITY: nonce comes straight from the operating system CSPRNG.
        use rand::rngs::OsRng;
        use rand::RngCore;
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, payload)
            .map_err(|e| JoseError::ProtectFailed(e.to_string()))?;

        let mut framed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(&framed))
    }

    fn unprotect(&self, blob: &str) -> Option<Vec<u8>> {
        let framed = URL_SAFE_NO_PAD.decode(blob).ok()?;
        if framed.len() < NONCE_SIZE + TAG_SIZE {
            return None;
        }

        let nonce = Nonce::from_slice(&framed[..NONCE_SIZE]);
        self.cipher.decrypt(nonce, &framed[NONCE_SIZE..]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format() -> AesGcmDataFormat {
        AesGcmDataFormat::new(&[0x42u8; 32]).unwrap()
    }

    #[test]
    fn protect_unprotect_round_trip() {
        let format = format();
        let blob = format.protect(b"ticket payload").unwrap();
        assert_eq!(format.unprotect(&blob).unwrap(), b"ticket payload");
    }

    #[test]
    fn output_is_url_safe() {
        let format = format();
        let blob = format.protect(&[0xffu8; 64]).unwrap();
        assert!(blob
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn nonce_makes_output_nondeterministic() {
        let format = format();
        let a = format.protect(b"same").unwrap();
        let b = format.protect(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_short_key() {
        assert!(AesGcmDataFormat::new(&[0u8; 16]).is_err());
    }

    #[test]
    fn unprotect_returns_none_on_bad_base64() {
        assert!(format().unprotect("not+valid+base64!").is_none());
    }

    #[test]
    fn unprotect_returns_none_on_truncated_frame() {
        let short = URL_SAFE_NO_PAD.encode([0u8; NONCE_SIZE + TAG_SIZE - 1]);
        assert!(format().unprotect(&short).is_none());
    }

    #[test]
    fn unprotect_returns_none_on_tampered_ciphertext() {
        let format = format();
        let blob = format.protect(b"payload").unwrap();
        let mut framed = URL_SAFE_NO_PAD.decode(&blob).unwrap();
        let last = framed.len() - 1;
        framed[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(&framed);
        assert!(format.unprotect(&tampered).is_none());
    }

    #[test]
    fn unprotect_returns_none_with_wrong_key() {
        let blob = format().protect(b"payload").unwrap();
        let other = AesGcmDataFormat::new(&[0x43u8; 32]).unwrap();
        assert!(other.unprotect(&blob).is_none());
    }
}
