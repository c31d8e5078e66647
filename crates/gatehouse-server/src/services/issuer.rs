//! Credential issuance.
//!
//! Every kind runs the same stage template: stamp lifetimes, filter the
//! identity, dispatch the provider with a pre-bound serializer, then run
//! the default serialization unless the provider decided otherwise. The
//! authorization code additionally lands in the single-use cache under a
//! fresh random handle.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use gatehouse_core::claims::claim_types;
use gatehouse_core::{AuthTicket, Claim, ClaimsIdentity, CredentialKind};
use gatehouse_jose::half_hash;

use crate::error::ServerError;
use crate::events::{EventDecision, IssueContext};
use crate::models::{TokenRequest, TokenResponse};
use crate::options::ServerOptions;
use crate::serializer::{JwsTicketSerializer, OpaqueTicketSerializer, TicketSerializer};

/// Authorization code handle length in bytes (256 bits).
const HANDLE_LENGTH: usize = 32;

/// Mints the four credential kinds.
pub struct TokenIssuer {
    options: Arc<ServerOptions>,
}

impl TokenIssuer {
    /// Create an issuer over shared options.
    #[must_use]
    pub fn new(options: Arc<ServerOptions>) -> Self {
        Self { options }
    }

    /// Issue an authorization code for the ticket.
    ///
    /// Returns the cache handle sent to the client, or `None` when the
    /// provider skipped issuance or serialization failed. When the
    /// provider supplies its own code the cache is left untouched.
    pub async fn issue_authorization_code(
        &self,
        request: &TokenRequest,
        response: &TokenResponse,
        ticket: &AuthTicket,
    ) -> Result<Option<String>, ServerError> {
        let mut ticket = ticket.clone();
        let (_, expires_at) =
            self.stamp_lifetimes(&mut ticket, self.options.authorization_code_lifetime);

        let serializer =
            OpaqueTicketSerializer::new(Arc::clone(&self.options.authorization_code_format));
        let mut ctx = IssueContext::new(request, response, &ticket, &serializer);
        let decision = self.options.provider.create_authorization_code(&mut ctx).await;

        match decision {
            EventDecision::Handled(value) => Ok(nonempty(value)),
            EventDecision::Skip => {
                tracing::debug!("Provider skipped authorization code issuance");
                Ok(None)
            }
            EventDecision::Reject(error) => Err(ServerError::Rejected(error)),
            EventDecision::Continue => {
                let blob = match serializer.serialize(&ticket).await {
                    Ok(blob) => blob,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize authorization code ticket");
                        return Ok(None);
                    }
                };

                // The cache write happens only after the provider returned,
                // so a request cancelled mid-dispatch leaves no state behind.
                let handle = generate_handle();
                self.options
                    .cache
                    .put(handle.clone(), blob, expires_at)
                    .await;
                Ok(Some(handle))
            }
        }
    }

    /// Issue an access token for the ticket.
    ///
    /// Self-contained JWS when an access token signer is configured,
    /// opaque otherwise. The audience is the union of the request's
    /// resource indicators and the ticket's resources.
    pub async fn issue_access_token(
        &self,
        request: &TokenRequest,
        response: &TokenResponse,
        ticket: &AuthTicket,
    ) -> Result<Option<String>, ServerError> {
        let mut ticket = ticket.clone();
        self.stamp_lifetimes(&mut ticket, self.options.access_token_lifetime);

        ticket.properties.audiences =
            merge_audiences(&request.resources, &ticket.properties.resources);
        ticket.identity = ticket
            .identity
            .clone_filtered(|c| CredentialKind::AccessToken.retains(c));
        normalize_subject(&mut ticket.identity);
        if !ticket.identity.has_claim(claim_types::SUBJECT) {
            return Err(ServerError::MissingSubject);
        }

        if let Some(signer) = &self.options.access_token_signer {
            ticket
                .identity
                .add_claim(Claim::new(claim_types::TOKEN_ID, Uuid::new_v4().to_string()));
            let serializer =
                JwsTicketSerializer::new(Arc::clone(signer), self.options.issuer.clone());
            let mut ctx = IssueContext::new(request, response, &ticket, &serializer);
            let decision = self.options.provider.create_access_token(&mut ctx).await;
            finish_issue(decision, &serializer, &ticket, "access token").await
        } else {
            let serializer =
                OpaqueTicketSerializer::new(Arc::clone(&self.options.access_token_format));
            let mut ctx = IssueContext::new(request, response, &ticket, &serializer);
            let decision = self.options.provider.create_access_token(&mut ctx).await;
            finish_issue(decision, &serializer, &ticket, "access token").await
        }
    }

    /// Issue an identity token for the ticket.
    ///
    /// The identity is filtered to id_token-scoped claims and then
    /// augmented with `iat`, the `c_hash` / `at_hash` link claims for the
    /// code and access token already present on the response, and the
    /// nonce. On the authorization-code grant the nonce comes from the
    /// ticket that travelled through the code, not from the current
    /// request.
    pub async fn issue_identity_token(
        &self,
        request: &TokenRequest,
        response: &TokenResponse,
        ticket: &AuthTicket,
    ) -> Result<Option<String>, ServerError> {
        let Some(signer) = &self.options.identity_token_signer else {
            tracing::warn!("Identity token requested but no signing credentials are configured");
            return Ok(None);
        };

        let mut ticket = ticket.clone();
        let (issued_at, _) =
            self.stamp_lifetimes(&mut ticket, self.options.identity_token_lifetime);

        ticket.identity = ticket
            .identity
            .clone_filtered(|c| CredentialKind::IdentityToken.retains(c));
        normalize_subject(&mut ticket.identity);
        if !ticket.identity.has_claim(claim_types::SUBJECT) {
            return Err(ServerError::MissingSubject);
        }

        ticket.identity.add_claim(Claim::new(
            claim_types::ISSUED_AT,
            issued_at.timestamp().to_string(),
        ));

        let algorithm = signer.algorithm();
        if let Some(code) = nonempty(response.code.clone()) {
            ticket
                .identity
                .add_claim(Claim::new(claim_types::CODE_HASH, half_hash(algorithm, &code)));
        }
        if let Some(access_token) = nonempty(response.access_token.clone()) {
            ticket.identity.add_claim(Claim::new(
                claim_types::ACCESS_TOKEN_HASH,
                half_hash(algorithm, &access_token),
            ));
        }

        let nonce = if request.is_authorization_code_grant() {
            ticket.properties.nonce.clone()
        } else {
            request.nonce.clone()
        };
        if let Some(nonce) = nonempty(nonce) {
            ticket
                .identity
                .add_claim(Claim::new(claim_types::NONCE, nonce));
        }

        if let Some(client_id) = nonempty(request.client_id.clone()) {
            ticket.properties.audiences = vec![client_id];
        }

        let serializer = JwsTicketSerializer::new(Arc::clone(signer), self.options.issuer.clone());
        let mut ctx = IssueContext::new(request, response, &ticket, &serializer);
        let decision = self.options.provider.create_identity_token(&mut ctx).await;
        finish_issue(decision, &serializer, &ticket, "identity token").await
    }

    /// Issue a refresh token for the ticket.
    ///
    /// Opaque, carries the full identity, and is never cached; refresh
    /// tokens are self-describing references the host stores wherever it
    /// likes.
    pub async fn issue_refresh_token(
        &self,
        request: &TokenRequest,
        response: &TokenResponse,
        ticket: &AuthTicket,
    ) -> Result<Option<String>, ServerError> {
        let mut ticket = ticket.clone();
        self.stamp_lifetimes(&mut ticket, self.options.refresh_token_lifetime);

        let serializer = OpaqueTicketSerializer::new(Arc::clone(&self.options.refresh_token_format));
        let mut ctx = IssueContext::new(request, response, &ticket, &serializer);
        let decision = self.options.provider.create_refresh_token(&mut ctx).await;
        finish_issue(decision, &serializer, &ticket, "refresh token").await
    }

    /// Apply the lifetime defaults the caller left unset.
    fn stamp_lifetimes(
        &self,
        ticket: &mut AuthTicket,
        lifetime: Duration,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let issued_at = *ticket
            .properties
            .issued_at
            .get_or_insert_with(|| self.options.clock.now());
        let expires_at = *ticket
            .properties
            .expires_at
            .get_or_insert(issued_at + lifetime);
        (issued_at, expires_at)
    }
}

/// Classify the provider decision for a non-cached kind and run the
/// default serialization on fall-through.
async fn finish_issue(
    decision: EventDecision<String>,
    serializer: &dyn TicketSerializer,
    ticket: &AuthTicket,
    kind: &str,
) -> Result<Option<String>, ServerError> {
    match decision {
        EventDecision::Handled(value) => Ok(nonempty(value)),
        EventDecision::Skip => {
            tracing::debug!(kind, "Provider skipped issuance");
            Ok(None)
        }
        EventDecision::Reject(error) => Err(ServerError::Rejected(error)),
        EventDecision::Continue => match serializer.serialize(ticket).await {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(kind, error = %e, "Default serialization failed");
                Ok(None)
            }
        },
    }
}

/// Ensure a `sub` claim (substituting from the name identifier) and keep
/// at most one name-identifier claim.
fn normalize_subject(identity: &mut ClaimsIdentity) {
    if !identity.has_claim(claim_types::SUBJECT) {
        if let Some(name_id) = identity.find_first(claim_types::NAME_IDENTIFIER) {
            let value = name_id.value.clone();
            identity.add_claim(Claim::new(claim_types::SUBJECT, value));
        }
    }

    let mut seen = false;
    identity.claims.retain(|c| {
        if c.claim_type == claim_types::NAME_IDENTIFIER {
            if seen {
                return false;
            }
            seen = true;
        }
        true
    });
}

/// Union of the request resources and ticket resources, first occurrence
/// wins, order preserved.
fn merge_audiences(request_resources: &[String], ticket_resources: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for resource in request_resources.iter().chain(ticket_resources) {
        if !merged.contains(resource) {
            merged.push(resource.clone());
        }
    }
    merged
}

/// A fresh 256-bit random handle, base64url-encoded.
///
/// SECURITY: handles come straight from the operating system CSPRNG.
fn generate_handle() -> String {
    use rand::rngs::OsRng;
    use rand::RngCore;
    let mut bytes = [0u8; HANDLE_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn nonempty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
