//! End-session (RP-initiated logout) request and response models.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Response parameter carrying the redirect target; never copied into the
/// redirect query itself.
pub(crate) const POST_LOGOUT_REDIRECT_URI: &str = "post_logout_redirect_uri";

/// The HTTP surface of a logout request, as handed over by the outer
/// front-end: method, declared content type, raw query string and body.
#[derive(Debug, Clone, Default)]
pub struct LogoutHttpRequest {
    /// HTTP request method.
    pub method: Method,

    /// The `Content-Type` header value, if any.
    pub content_type: Option<String>,

    /// Raw query string, without the leading `?`.
    pub query: String,

    /// Raw request body.
    pub body: String,
}

impl LogoutHttpRequest {
    /// Build a GET request from a query string.
    #[must_use]
    pub fn get(query: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            content_type: None,
            query: query.into(),
            body: String::new(),
        }
    }

    /// Build a form POST request from a body.
    #[must_use]
    pub fn form_post(body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            content_type: Some("application/x-www-form-urlencoded".to_string()),
            query: String::new(),
            body: body.into(),
        }
    }
}

/// Parameters of an end-session request, per OIDC RP-Initiated Logout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndSessionRequest {
    /// Previously issued ID token hinting at the session to terminate.
    /// The token may be expired.
    #[serde(default)]
    pub id_token_hint: Option<String>,

    /// URI the user agent should be redirected to after logout.
    #[serde(default)]
    pub post_logout_redirect_uri: Option<String>,

    /// Opaque value echoed back to the relying party on redirect.
    #[serde(default)]
    pub state: Option<String>,

    /// Client identifier of the relying party.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// The logout response under construction.
///
/// `parameters` holds everything destined for the post-logout redirect
/// query, plus the redirect target itself under
/// `post_logout_redirect_uri`; providers may add or replace entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EndSessionResponse {
    /// Response parameters, in insertion order.
    pub parameters: Map<String, Value>,

    /// The protocol error to render, if any stage rejected the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
}

impl EndSessionResponse {
    /// The redirect target, when present and non-empty.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> Option<&str> {
        self.parameters
            .get(POST_LOGOUT_REDIRECT_URI)
            .and_then(Value::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// Set a response parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }
}

/// A rendered logout response for the outer front-end to write.
#[derive(Debug, Clone)]
pub struct LogoutHttpResponse {
    /// HTTP status code.
    pub status: StatusCode,

    /// Redirect target for the `Location` header, when redirecting.
    pub redirect: Option<String>,

    /// Response body (the built-in error page), when rendering one.
    pub body: Option<String>,
}
