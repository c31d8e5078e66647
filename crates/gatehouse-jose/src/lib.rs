//! JOSE layer for the gatehouse authorization server.
//!
//! This crate provides:
//! - The [`DataFormat`] protect/unprotect contract for opaque credentials,
//!   with an AES-256-GCM default implementation
//! - [`SigningCredentials`] binding a private key, algorithm, and optional
//!   certificate, with deterministic `kid` / `x5t` derivation
//! - [`JwsSigner`] producing and validating RFC 7515 compact JWS
//! - The left-half hash used for the `c_hash` / `at_hash` link claims

mod error;
mod format;
mod hash;
mod keys;
mod signer;

pub use error::JoseError;
pub use format::{AesGcmDataFormat, DataFormat};
pub use hash::half_hash;
pub use keys::{certificate_thumbprint, modulus_key_id, x5t_thumbprint, SigningCredentials};
pub use signer::{JwsSigner, ValidatedToken};

pub use jsonwebtoken::Algorithm;
