//! Identities: ordered claim sets with delegated-actor chains.

use serde::{Deserialize, Serialize};

use crate::claims::Claim;

/// An authenticated identity: an ordered multiset of claims plus an
/// optional *actor* identity for delegation chains (token exchange,
/// on-behalf-of flows).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
    /// The claims asserted about this identity, in insertion order.
    pub claims: Vec<Claim>,

    /// The delegated actor acting on behalf of this identity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Box<ClaimsIdentity>>,
}

impl ClaimsIdentity {
    /// Create an identity from a claim list.
    #[must_use]
    pub fn new(claims: Vec<Claim>) -> Self {
        Self {
            claims,
            actor: None,
        }
    }

    /// Attach a delegated actor to this identity.
    #[must_use]
    pub fn with_actor(mut self, actor: ClaimsIdentity) -> Self {
        self.actor = Some(Box::new(actor));
        self
    }

    /// Append a claim.
    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// First claim of the given type, if any.
    #[must_use]
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }

    /// True iff a claim of the given type is present.
    #[must_use]
    pub fn has_claim(&self, claim_type: &str) -> bool {
        self.find_first(claim_type).is_some()
    }

    /// Remove every claim of the given type.
    pub fn remove_claims(&mut self, claim_type: &str) {
        self.claims.retain(|c| c.claim_type != claim_type);
    }

    /// Deep clone applying `keep` to every claim in this identity and in
    /// every actor along the delegation chain.
    ///
    /// The receiver is left untouched; pipelines filter into a fresh
    /// identity so concurrent observers never see a half-filtered claim
    /// set.
    #[must_use]
    pub fn clone_filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&Claim) -> bool,
    {
        fn filter_chain(identity: &ClaimsIdentity, keep: &dyn Fn(&Claim) -> bool) -> ClaimsIdentity {
            ClaimsIdentity {
                claims: identity
                    .claims
                    .iter()
                    .filter(|c| keep(c))
                    .cloned()
                    .collect(),
                actor: identity
                    .actor
                    .as_deref()
                    .map(|a| Box::new(filter_chain(a, keep))),
            }
        }
        filter_chain(self, &keep)
    }
}
