//! Shared fixtures for the lifecycle and logout suites.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use gatehouse_core::{AuthProperties, AuthTicket, Claim, ClaimsIdentity, FixedClock};
use gatehouse_jose::{JwsSigner, SigningCredentials};
use gatehouse_server::options::ServerOptionsBuilder;
use gatehouse_server::ServerOptions;

// 2048-bit RSA key pair, tests only.
pub const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../keys/test_rsa_private.pem");
pub const TEST_PUBLIC_KEY: &[u8] = include_bytes!("../keys/test_rsa_public.pem");

pub const ISSUER: &str = "https://idp.example.com";
pub const KEY_ID: &str = "test-key";

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn credentials() -> SigningCredentials {
    SigningCredentials::from_rsa_pem(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY)
        .expect("test key pair is valid")
        .with_key_id(KEY_ID)
}

pub fn signer() -> Arc<JwsSigner> {
    Arc::new(JwsSigner::new(vec![credentials()]).expect("signer builds"))
}

/// Options with the fixed clock, a protection key, and signing
/// credentials for identity tokens; tests tweak from here.
pub fn options_builder() -> ServerOptionsBuilder {
    ServerOptions::builder(ISSUER)
        .protection_key(&[0x42u8; 32])
        .signing_credentials(vec![credentials()])
        .clock(Arc::new(FixedClock(fixed_now())))
}

pub fn ticket_for(sub: &str) -> AuthTicket {
    AuthTicket::new(
        ClaimsIdentity::new(vec![Claim::new("sub", sub)]),
        AuthProperties::new(),
    )
}
