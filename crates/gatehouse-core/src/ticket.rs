//! Authentication tickets: the unit serialized into opaque credentials.

use serde::{Deserialize, Serialize};

use crate::identity::ClaimsIdentity;
use crate::properties::AuthProperties;

/// An identity together with its authentication properties.
///
/// Tickets are created during issuance, serialized into the credential, and
/// discarded; pipelines deep-copy at stage boundaries instead of mutating a
/// shared instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTicket {
    /// The authenticated identity.
    pub identity: ClaimsIdentity,

    /// Lifetimes, nonce, resources and host-defined entries.
    pub properties: AuthProperties,
}

impl AuthTicket {
    /// Bundle an identity and its properties.
    #[must_use]
    pub fn new(identity: ClaimsIdentity, properties: AuthProperties) -> Self {
        Self {
            identity,
            properties,
        }
    }

    /// Serialize to the JSON byte form embedded in opaque credentials.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Rebuild a ticket from its JSON byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
