//! Ticket serializers.
//!
//! Each pipeline binds one serializer at dispatch time: opaque kinds wrap
//! a [`DataFormat`], self-contained kinds wrap the [`JwsSigner`]. Providers
//! receive the bound serializer through the stage context and may invoke it
//! themselves before overriding the result.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use gatehouse_core::{AuthProperties, AuthTicket, Claim, ClaimsIdentity};
use gatehouse_jose::{DataFormat, JwsSigner};

use crate::error::ServerError;

/// Registered claims rebuilt from the token envelope rather than carried
/// as identity claims.
const ENVELOPE_CLAIMS: [&str; 3] = ["aud", "nbf", "exp"];

/// Registered claims emitted as JSON numbers when their value is integral.
const NUMERIC_CLAIMS: [&str; 4] = ["iat", "nbf", "exp", "auth_time"];

/// Serializes tickets to credential strings and back.
#[async_trait]
pub trait TicketSerializer: Send + Sync {
    /// Serialize a ticket into its credential form.
    async fn serialize(&self, ticket: &AuthTicket) -> Result<String, ServerError>;

    /// Rebuild a ticket from a credential string; `None` when the value is
    /// invalid, tampered with, or foreign.
    async fn deserialize(&self, value: &str) -> Result<Option<AuthTicket>, ServerError>;
}

/// Opaque serializer: JSON ticket bytes through a [`DataFormat`].
pub struct OpaqueTicketSerializer {
    format: Arc<dyn DataFormat>,
}

impl OpaqueTicketSerializer {
    /// Bind a data format.
    #[must_use]
    pub fn new(format: Arc<dyn DataFormat>) -> Self {
        Self { format }
    }
}

#[async_trait]
impl TicketSerializer for OpaqueTicketSerializer {
    async fn serialize(&self, ticket: &AuthTicket) -> Result<String, ServerError> {
        let bytes = ticket.to_bytes()?;
        Ok(self.format.protect(&bytes)?)
    }

    async fn deserialize(&self, value: &str) -> Result<Option<AuthTicket>, ServerError> {
        let Some(bytes) = self.format.unprotect(value) else {
            return Ok(None);
        };
        match AuthTicket::from_bytes(&bytes) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(e) => {
                tracing::warn!(error = %e, "Unprotected blob does not contain a valid ticket");
                Ok(None)
            }
        }
    }
}

/// Self-contained serializer: ticket to RFC 7519 claims, signed as JWS.
pub struct JwsTicketSerializer {
    signer: Arc<JwsSigner>,
    issuer: String,
}

impl JwsTicketSerializer {
    /// Bind a signer and the issuer identifier stamped into `iss`.
    #[must_use]
    pub fn new(signer: Arc<JwsSigner>, issuer: impl Into<String>) -> Self {
        Self {
            signer,
            issuer: issuer.into(),
        }
    }

    /// Build the JWS payload for a ticket.
    ///
    /// Identity claims come first; the registered envelope claims (`iss`,
    /// `aud`, `nbf`, `exp`) are then stamped from the configuration and
    /// the ticket properties, overriding identity-provided values. A
    /// single audience is a bare string; several become an array.
    fn build_payload(&self, ticket: &AuthTicket) -> Map<String, Value> {
        let mut payload = Map::new();

        for claim in &ticket.identity.claims {
            let value = claim_value(&claim.claim_type, &claim.value);
            match payload.entry(claim.claim_type.clone()) {
                serde_json::map::Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                serde_json::map::Entry::Occupied(mut slot) => match slot.get_mut() {
                    Value::Array(items) => items.push(value),
                    existing => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                },
            }
        }

        payload.insert("iss".to_string(), Value::String(self.issuer.clone()));

        let audiences = &ticket.properties.audiences;
        match audiences.len() {
            0 => {}
            1 => {
                payload.insert("aud".to_string(), Value::String(audiences[0].clone()));
            }
            _ => {
                payload.insert(
                    "aud".to_string(),
                    Value::Array(audiences.iter().cloned().map(Value::String).collect()),
                );
            }
        }

        if let Some(issued_at) = ticket.properties.issued_at {
            payload.insert("nbf".to_string(), Value::from(issued_at.timestamp()));
        }
        if let Some(expires_at) = ticket.properties.expires_at {
            payload.insert("exp".to_string(), Value::from(expires_at.timestamp()));
        }

        payload
    }
}

#[async_trait]
impl TicketSerializer for JwsTicketSerializer {
    async fn serialize(&self, ticket: &AuthTicket) -> Result<String, ServerError> {
        let payload = self.build_payload(ticket);
        Ok(self.signer.sign(&payload)?)
    }

    async fn deserialize(&self, value: &str) -> Result<Option<AuthTicket>, ServerError> {
        let validated = match self.signer.validate(value, &self.issuer) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::debug!(error = %e, "Token validation failed");
                return Ok(None);
            }
        };

        let mut identity = ClaimsIdentity::default();
        for (claim_type, value) in &validated.claims {
            if ENVELOPE_CLAIMS.contains(&claim_type.as_str()) {
                continue;
            }
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(item) {
                            identity.add_claim(Claim::new(claim_type, text));
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        identity.add_claim(Claim::new(claim_type, text));
                    }
                }
            }
        }

        let mut properties = AuthProperties::new();
        properties.issued_at = validated.valid_from;
        properties.expires_at = validated.valid_to;
        properties.audiences = validated.audiences;

        Ok(Some(AuthTicket::new(identity, properties)))
    }
}

/// Emit the registered numeric claims as numbers, everything else as text.
fn claim_value(claim_type: &str, value: &str) -> Value {
    if NUMERIC_CLAIMS.contains(&claim_type) {
        if let Ok(n) = value.parse::<i64>() {
            return Value::from(n);
        }
    }
    Value::String(value.to_string())
}

/// Render a scalar claim value as text; objects and nulls are dropped.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
