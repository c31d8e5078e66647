//! The host-supplied provider interface.

use async_trait::async_trait;

use gatehouse_core::AuthTicket;

use super::contexts::{IssueContext, LogoutContext, LogoutResponseContext, ReceiveContext};
use super::EventDecision;

/// Extension point invoked at every pipeline stage.
///
/// Every method defaults to [`EventDecision::Continue`], so a host only
/// overrides the stages it cares about. Implementations must be
/// thread-safe; a provider is shared across concurrent requests.
///
/// Provider panics and errors are not swallowed by the pipelines: a stage
/// that fails inside the provider indicates a host bug and propagates.
#[async_trait]
pub trait ServerProvider: Send + Sync {
    /// Called before the default serialization of an authorization code.
    async fn create_authorization_code(
        &self,
        _ctx: &mut IssueContext<'_>,
    ) -> EventDecision<String> {
        EventDecision::Continue
    }

    /// Called before the default serialization of an access token.
    async fn create_access_token(&self, _ctx: &mut IssueContext<'_>) -> EventDecision<String> {
        EventDecision::Continue
    }

    /// Called before the default serialization of an identity token.
    async fn create_identity_token(&self, _ctx: &mut IssueContext<'_>) -> EventDecision<String> {
        EventDecision::Continue
    }

    /// Called before the default serialization of a refresh token.
    async fn create_refresh_token(&self, _ctx: &mut IssueContext<'_>) -> EventDecision<String> {
        EventDecision::Continue
    }

    /// Called before the default redemption of an authorization code.
    async fn receive_authorization_code(
        &self,
        _ctx: &mut ReceiveContext<'_>,
    ) -> EventDecision<AuthTicket> {
        EventDecision::Continue
    }

    /// Called before the default deserialization of an access token.
    async fn receive_access_token(
        &self,
        _ctx: &mut ReceiveContext<'_>,
    ) -> EventDecision<AuthTicket> {
        EventDecision::Continue
    }

    /// Called before the default deserialization of an identity token.
    async fn receive_identity_token(
        &self,
        _ctx: &mut ReceiveContext<'_>,
    ) -> EventDecision<AuthTicket> {
        EventDecision::Continue
    }

    /// Called before the default deserialization of a refresh token.
    async fn receive_refresh_token(
        &self,
        _ctx: &mut ReceiveContext<'_>,
    ) -> EventDecision<AuthTicket> {
        EventDecision::Continue
    }

    /// Called once the end-session request has been parsed.
    async fn extract_logout_request(&self, _ctx: &LogoutContext<'_>) -> EventDecision<()> {
        EventDecision::Continue
    }

    /// Called to validate the end-session request.
    async fn validate_logout_request(&self, _ctx: &LogoutContext<'_>) -> EventDecision<()> {
        EventDecision::Continue
    }

    /// Called to perform the logout itself (session revocation and the
    /// like live in the host).
    async fn handle_logout_request(
        &self,
        _ctx: &mut LogoutResponseContext<'_>,
    ) -> EventDecision<()> {
        EventDecision::Continue
    }

    /// Called before the logout response is rendered.
    async fn apply_logout_response(
        &self,
        _ctx: &mut LogoutResponseContext<'_>,
    ) -> EventDecision<()> {
        EventDecision::Continue
    }
}

/// Provider that leaves every stage to the default behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl ServerProvider for DefaultProvider {}
