//! JOSE error types.

use thiserror::Error;

/// Errors raised by the signing and protection layer.
#[derive(Debug, Error)]
pub enum JoseError {
    /// A key could not be parsed or is unusable for the operation.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// JWS production failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// The token is malformed or its claims cannot be read.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Signature verification failed.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token's `iss` claim does not match the expected issuer.
    #[error("Token issuer mismatch")]
    IssuerMismatch,

    /// The token header names a `kid` with no matching credential.
    #[error("Unknown key ID: {0}")]
    UnknownKeyId(String),

    /// Opaque protection failed.
    #[error("Protection failed: {0}")]
    ProtectFailed(String),
}
