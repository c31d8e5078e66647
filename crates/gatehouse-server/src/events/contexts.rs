//! Stage contexts handed to the provider.

use gatehouse_core::AuthTicket;

use crate::error::ServerError;
use crate::models::{EndSessionRequest, EndSessionResponse, TokenRequest, TokenResponse};
use crate::serializer::TicketSerializer;

/// Context for the four `create_*` stages.
///
/// Carries the request, the response assembled so far, and the ticket
/// about to be serialized, plus the serializer bound to this credential
/// kind so the provider can run the default serialization itself.
pub struct IssueContext<'a> {
    /// The token-endpoint request being served.
    pub request: &'a TokenRequest,

    /// The response assembled so far (earlier credentials included).
    pub response: &'a TokenResponse,

    /// The filtered, lifetime-stamped ticket for this credential.
    pub ticket: &'a AuthTicket,

    serializer: &'a dyn TicketSerializer,
}

impl<'a> IssueContext<'a> {
    pub(crate) fn new(
        request: &'a TokenRequest,
        response: &'a TokenResponse,
        ticket: &'a AuthTicket,
        serializer: &'a dyn TicketSerializer,
    ) -> Self {
        Self {
            request,
            response,
            ticket,
            serializer,
        }
    }

    /// Run the default serializer over the context ticket.
    pub async fn serialize(&self) -> Result<String, ServerError> {
        self.serializer.serialize(self.ticket).await
    }
}

/// Context for the four `receive_*` stages.
pub struct ReceiveContext<'a> {
    /// The request carrying the credential.
    pub request: &'a TokenRequest,

    /// The raw credential string as presented by the client.
    pub value: &'a str,

    deserializer: &'a dyn TicketSerializer,
}

impl<'a> ReceiveContext<'a> {
    pub(crate) fn new(
        request: &'a TokenRequest,
        value: &'a str,
        deserializer: &'a dyn TicketSerializer,
    ) -> Self {
        Self {
            request,
            value,
            deserializer,
        }
    }

    /// Run the default deserializer over an arbitrary credential string.
    pub async fn deserialize(&self, value: &str) -> Result<Option<AuthTicket>, ServerError> {
        self.deserializer.deserialize(value).await
    }
}

/// Read-only context for the logout extract and validate stages.
pub struct LogoutContext<'a> {
    /// The parsed end-session request.
    pub request: &'a EndSessionRequest,
}

/// Mutable context for the logout handle and apply stages.
pub struct LogoutResponseContext<'a> {
    /// The parsed end-session request, absent when parsing failed.
    pub request: Option<&'a EndSessionRequest>,

    /// The response under construction; providers may add parameters or
    /// replace the error.
    pub response: &'a mut EndSessionResponse,
}
