//! Claims and destination-based filtering.
//!
//! Every claim carries a *destination set* naming the credential kinds that
//! may embed it. Self-contained credentials (access and identity tokens)
//! only serialize claims scoped to them; opaque credentials carry the full
//! identity because the payload never leaves the server unencrypted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Well-known claim types.
pub mod claim_types {
    /// OIDC subject identifier.
    pub const SUBJECT: &str = "sub";

    /// Legacy name-identifier claim type carried by federated identities.
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

    /// Replay-protection nonce bound into identity tokens.
    pub const NONCE: &str = "nonce";

    /// Issued-at timestamp (seconds since the Unix epoch).
    pub const ISSUED_AT: &str = "iat";

    /// JWT identifier.
    pub const TOKEN_ID: &str = "jti";

    /// Left-half hash of the authorization code (OIDC Core 3.3.2.11).
    pub const CODE_HASH: &str = "c_hash";

    /// Left-half hash of the access token (OIDC Core 3.1.3.6).
    pub const ACCESS_TOKEN_HASH: &str = "at_hash";
}

/// Destination tags recognized by the filter policies.
pub mod destinations {
    /// The claim may appear in access tokens.
    pub const ACCESS_TOKEN: &str = "token";

    /// The claim may appear in identity tokens.
    pub const IDENTITY_TOKEN: &str = "id_token";
}

/// A single claim: a type, a value, and the set of destinations allowed to
/// carry it.
///
/// A claim with an empty destination set is *unscoped* and excluded from
/// every self-contained credential. The subject claims
/// ([`claim_types::SUBJECT`] and [`claim_types::NAME_IDENTIFIER`]) are
/// exempt and always retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type, e.g. `sub` or `email`.
    #[serde(rename = "type")]
    pub claim_type: String,

    /// Claim value.
    pub value: String,

    /// Destination tags naming the credential kinds that may carry this
    /// claim.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub destinations: BTreeSet<String>,
}

impl Claim {
    /// Create an unscoped claim.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            destinations: BTreeSet::new(),
        }
    }

    /// Add a destination tag to this claim.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destinations.insert(destination.into());
        self
    }

    /// True iff `destination` is in this claim's destination set.
    #[must_use]
    pub fn has_destination(&self, destination: &str) -> bool {
        self.destinations.contains(destination)
    }

    /// True for the claim types that survive every filter.
    #[must_use]
    pub fn is_subject_claim(&self) -> bool {
        self.claim_type == claim_types::SUBJECT || self.claim_type == claim_types::NAME_IDENTIFIER
    }
}

/// The four credential kinds minted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// Short-lived single-use authorization code.
    AuthorizationCode,
    /// Credential authorizing API calls to resources.
    AccessToken,
    /// Signed assertion about the end-user.
    IdentityToken,
    /// Long-lived credential for obtaining new access tokens.
    RefreshToken,
}

impl CredentialKind {
    /// The destination tag a claim must carry to appear in this credential,
    /// or `None` for the opaque kinds that embed the full identity.
    #[must_use]
    pub fn destination(self) -> Option<&'static str> {
        match self {
            Self::AccessToken => Some(destinations::ACCESS_TOKEN),
            Self::IdentityToken => Some(destinations::IDENTITY_TOKEN),
            Self::AuthorizationCode | Self::RefreshToken => None,
        }
    }

    /// Filter policy: should `claim` be retained in this credential kind?
    ///
    /// Authorization codes and refresh tokens keep every claim. Access and
    /// identity tokens keep the subject claims unconditionally, and
    /// otherwise only claims scoped to their destination tag.
    #[must_use]
    pub fn retains(self, claim: &Claim) -> bool {
        match self.destination() {
            None => true,
            Some(tag) => claim.is_subject_claim() || claim.has_destination(tag),
        }
    }
}
