//! Left-half hashes linking credentials inside an identity token.
//!
//! OIDC Core binds the authorization code and access token into the id
//! token as `c_hash` / `at_hash`: hash the ASCII form of the value with
//! the hash function matching the JWS algorithm, keep the left half of the
//! digest, base64url-encode it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::Algorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Compute the left-half hash of `value` for the given JWS algorithm.
///
/// SHA-256 for the `*256` algorithms, SHA-384 for `*384`, SHA-512 for
/// `*512` and EdDSA.
#[must_use]
pub fn half_hash(algorithm: Algorithm, value: &str) -> String {
    let digest: Vec<u8> = match algorithm {
        Algorithm::HS256 | Algorithm::RS256 | Algorithm::ES256 | Algorithm::PS256 => {
            Sha256::digest(value.as_bytes()).to_vec()
        }
        Algorithm::HS384 | Algorithm::RS384 | Algorithm::ES384 | Algorithm::PS384 => {
            Sha384::digest(value.as_bytes()).to_vec()
        }
        Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 | Algorithm::EdDSA => {
            Sha512::digest(value.as_bytes()).to_vec()
        }
    };

    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}
