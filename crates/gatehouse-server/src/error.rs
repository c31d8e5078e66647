//! Protocol and pipeline error types.
//!
//! Wire errors follow RFC 6749: an `error` code plus optional
//! `error_description` / `error_uri`, surfaced verbatim when a provider
//! rejects a stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OAuth2 error codes used by the lifecycle pipelines, RFC 6749 Section 5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is missing a required parameter or is malformed.
    InvalidRequest,
    /// The provided authorization grant or refresh token is invalid.
    InvalidGrant,
    /// Client authentication failed.
    InvalidClient,
    /// The client is not authorized for this grant type.
    UnauthorizedClient,
    /// The authorization server does not support the grant type.
    UnsupportedGrantType,
    /// The requested scope is invalid, unknown, or malformed.
    InvalidScope,
    /// The resource owner denied the request.
    AccessDenied,
    /// The authorization server encountered an unexpected condition.
    ServerError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidClient => "invalid_client",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope => "invalid_scope",
            Self::AccessDenied => "access_denied",
            Self::ServerError => "server_error",
        };
        write!(f, "{s}")
    }
}

/// A wire-level protocol error: the `error` code with its optional
/// description and URI, serialized exactly as it will appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolError {
    /// Error code. Provider-originated rejections may carry extension
    /// codes, so this is not restricted to [`ErrorCode`].
    pub error: String,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// URI with more information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl ProtocolError {
    /// Create an error with a code and description.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            error: code.to_string(),
            error_description: Some(description.into()),
            error_uri: None,
        }
    }

    /// Create an `invalid_request` error.
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, description)
    }

    /// Attach an `error_uri`.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.error_uri = Some(uri.into());
        self
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(ref description) = self.error_description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

/// Failures surfaced by the lifecycle pipelines.
///
/// Default-path serialization failures never appear here; they are logged
/// and collapse to an absent credential or ticket so the endpoint layer can
/// answer `invalid_grant`. Only provider rejections and programmer errors
/// propagate.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Access-token or identity-token issuance was attempted for an
    /// identity with neither a `sub` nor a name-identifier claim.
    #[error("Token issuance requires a subject claim")]
    MissingSubject,

    /// A provider rejected the stage; surfaced verbatim on the wire.
    #[error("Request rejected: {0}")]
    Rejected(ProtocolError),

    /// The signing/protection layer failed outside a default
    /// serialization path (e.g. invalid configuration).
    #[error("JOSE failure: {0}")]
    Jose(#[from] gatehouse_jose::JoseError),

    /// Ticket serialization failed outside a default path.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The options are incomplete or inconsistent.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
