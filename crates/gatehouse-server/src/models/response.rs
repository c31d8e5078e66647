//! Token endpoint response model.

use serde::Serialize;

/// The token-endpoint response under construction.
///
/// The endpoint layer fills fields as the pipelines produce credentials;
/// the identity-token pipeline reads `code` and `access_token` back to
/// derive the `c_hash` / `at_hash` link claims.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenResponse {
    /// Authorization code, when minted in this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Identity token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type, normally `Bearer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Access token lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
