//! Token endpoint request model.

use serde::Deserialize;

/// OAuth2 grant type identifiers.
pub mod grant_types {
    /// RFC 6749 authorization code grant.
    pub const AUTHORIZATION_CODE: &str = "authorization_code";
    /// RFC 6749 refresh token grant.
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// RFC 6749 client credentials grant.
    pub const CLIENT_CREDENTIALS: &str = "client_credentials";
}

/// The token-endpoint request parameters the lifecycle pipelines read.
///
/// The outer front-end parses the HTTP request; the pipelines only consume
/// the fields that shape credentials: the grant, the client, the nonce,
/// and the requested resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// The `grant_type` parameter; empty for authorize-endpoint issuance.
    #[serde(default)]
    pub grant_type: String,

    /// The requesting client's identifier.
    #[serde(default)]
    pub client_id: Option<String>,

    /// The `nonce` parameter of the current request.
    #[serde(default)]
    pub nonce: Option<String>,

    /// Requested scope.
    #[serde(default)]
    pub scope: Option<String>,

    /// RFC 8707 resource indicators, in request order.
    #[serde(default, rename = "resource")]
    pub resources: Vec<String>,
}

impl TokenRequest {
    /// True iff this is an `authorization_code` grant.
    #[must_use]
    pub fn is_authorization_code_grant(&self) -> bool {
        self.grant_type == grant_types::AUTHORIZATION_CODE
    }

    /// True iff this is a `refresh_token` grant.
    #[must_use]
    pub fn is_refresh_token_grant(&self) -> bool {
        self.grant_type == grant_types::REFRESH_TOKEN
    }
}
