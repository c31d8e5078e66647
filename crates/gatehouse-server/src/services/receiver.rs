//! Credential redemption.
//!
//! Mirrors the issue pipelines: each kind binds the matching deserializer,
//! dispatches the provider, and on fall-through runs the default
//! deserialization. Audience and lifetime enforcement intentionally do not
//! happen here; the endpoint layers own those checks against the
//! rehydrated ticket.

use std::sync::Arc;

use gatehouse_core::AuthTicket;

use crate::error::ServerError;
use crate::events::{EventDecision, ReceiveContext};
use crate::models::TokenRequest;
use crate::options::ServerOptions;
use crate::serializer::{JwsTicketSerializer, OpaqueTicketSerializer, TicketSerializer};

/// Re-hydrates the four credential kinds.
pub struct TokenReceiver {
    options: Arc<ServerOptions>,
}

impl TokenReceiver {
    /// Create a receiver over shared options.
    #[must_use]
    pub fn new(options: Arc<ServerOptions>) -> Self {
        Self { options }
    }

    /// Redeem an authorization code handle.
    ///
    /// The cache lookup is a single atomic take, so of any number of
    /// concurrent redemptions of the same handle exactly one yields the
    /// ticket; the rest observe `None`, indistinguishable from expiry.
    pub async fn receive_authorization_code(
        &self,
        request: &TokenRequest,
        value: &str,
    ) -> Result<Option<AuthTicket>, ServerError> {
        let serializer =
            OpaqueTicketSerializer::new(Arc::clone(&self.options.authorization_code_format));
        let mut ctx = ReceiveContext::new(request, value, &serializer);
        let decision = self
            .options
            .provider
            .receive_authorization_code(&mut ctx)
            .await;

        match decision {
            EventDecision::Handled(ticket) => Ok(ticket),
            EventDecision::Skip => Ok(None),
            EventDecision::Reject(error) => Err(ServerError::Rejected(error)),
            EventDecision::Continue => {
                let Some(blob) = self.options.cache.take(value).await else {
                    tracing::debug!(
                        "Authorization code not found, expired, or already redeemed"
                    );
                    return Ok(None);
                };
                serializer.deserialize(&blob).await
            }
        }
    }

    /// Re-hydrate an access token.
    pub async fn receive_access_token(
        &self,
        request: &TokenRequest,
        value: &str,
    ) -> Result<Option<AuthTicket>, ServerError> {
        if let Some(signer) = &self.options.access_token_signer {
            let serializer =
                JwsTicketSerializer::new(Arc::clone(signer), self.options.issuer.clone());
            let mut ctx = ReceiveContext::new(request, value, &serializer);
            let decision = self.options.provider.receive_access_token(&mut ctx).await;
            finish_receive(decision, &serializer, value, "access token").await
        } else {
            let serializer =
                OpaqueTicketSerializer::new(Arc::clone(&self.options.access_token_format));
            let mut ctx = ReceiveContext::new(request, value, &serializer);
            let decision = self.options.provider.receive_access_token(&mut ctx).await;
            finish_receive(decision, &serializer, value, "access token").await
        }
    }

    /// Re-hydrate an identity token.
    pub async fn receive_identity_token(
        &self,
        request: &TokenRequest,
        value: &str,
    ) -> Result<Option<AuthTicket>, ServerError> {
        let Some(signer) = &self.options.identity_token_signer else {
            tracing::warn!("Identity token presented but no signing credentials are configured");
            return Ok(None);
        };

        let serializer = JwsTicketSerializer::new(Arc::clone(signer), self.options.issuer.clone());
        let mut ctx = ReceiveContext::new(request, value, &serializer);
        let decision = self.options.provider.receive_identity_token(&mut ctx).await;
        finish_receive(decision, &serializer, value, "identity token").await
    }

    /// Re-hydrate a refresh token.
    pub async fn receive_refresh_token(
        &self,
        request: &TokenRequest,
        value: &str,
    ) -> Result<Option<AuthTicket>, ServerError> {
        let serializer =
            OpaqueTicketSerializer::new(Arc::clone(&self.options.refresh_token_format));
        let mut ctx = ReceiveContext::new(request, value, &serializer);
        let decision = self.options.provider.receive_refresh_token(&mut ctx).await;
        finish_receive(decision, &serializer, value, "refresh token").await
    }
}

/// Classify the provider decision for a non-cached kind and run the
/// default deserialization on fall-through.
async fn finish_receive(
    decision: EventDecision<AuthTicket>,
    serializer: &dyn TicketSerializer,
    value: &str,
    kind: &str,
) -> Result<Option<AuthTicket>, ServerError> {
    match decision {
        EventDecision::Handled(ticket) => Ok(ticket),
        EventDecision::Skip => {
            tracing::debug!(kind, "Provider skipped redemption");
            Ok(None)
        }
        EventDecision::Reject(error) => Err(ServerError::Rejected(error)),
        EventDecision::Continue => serializer.deserialize(value).await,
    }
}
