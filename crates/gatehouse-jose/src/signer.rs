//! JWS production and validation over an ordered credential list.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, encode, Header, Validation};
use serde_json::{Map, Value};

use crate::error::JoseError;
use crate::keys::SigningCredentials;

/// Outcome of a successful JWS validation.
///
/// Audience and lifetime checks are intentionally not performed here; the
/// bounds and audiences are extracted for the caller to enforce.
#[derive(Debug)]
pub struct ValidatedToken {
    /// The full claim set of the token payload.
    pub claims: Map<String, Value>,

    /// The `nbf` claim, when present.
    pub valid_from: Option<DateTime<Utc>>,

    /// The `exp` claim, when present.
    pub valid_to: Option<DateTime<Utc>>,

    /// Every `aud` value, in token order.
    pub audiences: Vec<String>,
}

/// Signs with the first credential of an ordered list and verifies against
/// whichever credential the token's `kid` selects.
pub struct JwsSigner {
    credentials: Vec<SigningCredentials>,
}

impl JwsSigner {
    /// Create a signer from an ordered, non-empty credential list. The
    /// first entry is the active signing credential.
    pub fn new(credentials: Vec<SigningCredentials>) -> Result<Self, JoseError> {
        if credentials.is_empty() {
            return Err(JoseError::InvalidKey(
                "At least one signing credential is required".to_string(),
            ));
        }
        Ok(Self { credentials })
    }

    /// The active signing credential.
    #[must_use]
    pub fn active(&self) -> &SigningCredentials {
        &self.credentials[0]
    }

    /// The algorithm of the active credential.
    #[must_use]
    pub fn algorithm(&self) -> jsonwebtoken::Algorithm {
        self.active().algorithm()
    }

    /// Produce a compact JWS over the given payload.
    ///
    /// The header carries `alg`, `typ=JWT`, the derived `kid`, and `x5t`
    /// when the active key is certificate-bound.
    pub fn sign(&self, payload: &Map<String, Value>) -> Result<String, JoseError> {
        let active = self.active();

        let mut header = Header::new(active.algorithm());
        header.kid = active.key_id();
        header.x5t = active.x5t();

        encode(&header, payload, active.encoding_key())
            .map_err(|e| JoseError::SigningFailed(e.to_string()))
    }

    /// Verify a compact JWS and extract its claims.
    ///
    /// Checks the signature and the `iss` claim against `expected_issuer`.
    /// Lifetime and audience checks are skipped; callers own them. When
    /// the token header names a `kid` that matches no configured
    /// credential the token is rejected rather than tried against the
    /// active key.
    pub fn validate(&self, token: &str, expected_issuer: &str) -> Result<ValidatedToken, JoseError> {
        let header = decode_header(token)
            .map_err(|e| JoseError::InvalidToken(format!("Failed to decode header: {e}")))?;

        let credential = match header.kid {
            Some(ref kid) => self
                .credentials
                .iter()
                .find(|c| c.key_id().as_deref() == Some(kid))
                .ok_or_else(|| JoseError::UnknownKeyId(kid.clone()))?,
            None => self.active(),
        };

        let mut validation = Validation::new(credential.algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[expected_issuer]);

        let data = decode::<Map<String, Value>>(token, credential.decoding_key(), &validation)
            .map_err(map_jwt_error)?;
        let claims = data.claims;

        Ok(ValidatedToken {
            valid_from: claims.get("nbf").and_then(numeric_date),
            valid_to: claims.get("exp").and_then(numeric_date),
            audiences: claims.get("aud").map(audience_values).unwrap_or_default(),
            claims,
        })
    }
}

/// Read a NumericDate claim value.
fn numeric_date(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_i64()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Collect `aud` into a list whether the claim is a string or an array.
fn audience_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> JoseError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => JoseError::InvalidSignature,
        ErrorKind::InvalidIssuer => JoseError::IssuerMismatch,
        _ => JoseError::InvalidToken(format!("Token validation failed: {err}")),
    }
}
