//! Integration tests for the credential lifecycle: issue and redeem across
//! the four kinds, claim filtering, hash-link claims, nonce restoration,
//! and single-use code semantics.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use common::{fixed_now, options_builder, signer, ticket_for, ISSUER, KEY_ID};

use gatehouse_core::claims::{claim_types, destinations};
use gatehouse_core::{AuthProperties, AuthTicket, Claim, ClaimsIdentity, UtcClock};
use gatehouse_jose::{half_hash, Algorithm};
use gatehouse_server::models::{grant_types, TokenRequest, TokenResponse};
use gatehouse_server::{
    EventDecision, IssueContext, ProtocolError, ReceiveContext, ServerError, ServerProvider,
    TokenIssuer, TokenReceiver,
};

fn request() -> TokenRequest {
    TokenRequest {
        client_id: Some("client-1".to_string()),
        ..TokenRequest::default()
    }
}

/// Decode a JWS produced by the tests' own signer.
fn decode(token: &str) -> serde_json::Map<String, serde_json::Value> {
    signer()
        .validate(token, ISSUER)
        .expect("token validates")
        .claims
}

// ---------------------------------------------------------------------------
// Authorization codes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn code_round_trips_with_full_identity_and_properties() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let mut ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new("sub", "alice"),
            Claim::new("email", "alice@example.com").with_destination(destinations::IDENTITY_TOKEN),
            Claim::new("internal", "1"),
        ]),
        AuthProperties::new().with_nonce("n-123"),
    );
    ticket.properties.insert_extra("session", "s-42");

    let code = issuer
        .issue_authorization_code(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .expect("code issued");

    let redeemed = receiver
        .receive_authorization_code(&request(), &code)
        .await
        .unwrap()
        .expect("code redeems");

    // Opaque credentials carry the full identity, unfiltered.
    assert_eq!(redeemed.identity, ticket.identity);
    assert_eq!(redeemed.properties.nonce.as_deref(), Some("n-123"));
    assert_eq!(redeemed.properties.get_extra("session"), Some("s-42"));
    assert_eq!(redeemed.properties.issued_at, Some(fixed_now()));
    assert_eq!(
        redeemed.properties.expires_at,
        Some(fixed_now() + Duration::minutes(5))
    );
}

#[tokio::test]
async fn code_is_single_use() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let code = issuer
        .issue_authorization_code(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    assert!(receiver
        .receive_authorization_code(&request(), &code)
        .await
        .unwrap()
        .is_some());
    assert!(receiver
        .receive_authorization_code(&request(), &code)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_redemption_has_exactly_one_winner() {
    // Wall clock here: the fixed clock would also work, but the point is
    // racing real tasks.
    let options = Arc::new(
        options_builder()
            .clock(Arc::new(UtcClock))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = Arc::new(TokenReceiver::new(options));

    let code = issuer
        .issue_authorization_code(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let receiver = Arc::clone(&receiver);
        let code = code.clone();
        tasks.push(tokio::spawn(async move {
            receiver
                .receive_authorization_code(&TokenRequest::default(), &code)
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap().is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn expired_code_redeems_to_nothing() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let mut ticket = ticket_for("alice");
    ticket.properties.issued_at = Some(fixed_now() - Duration::minutes(10));
    ticket.properties.expires_at = Some(fixed_now() - Duration::minutes(5));

    let code = issuer
        .issue_authorization_code(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    assert!(receiver
        .receive_authorization_code(&request(), &code)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn unknown_code_redeems_to_nothing() {
    let options = Arc::new(options_builder().build().unwrap());
    let receiver = TokenReceiver::new(options);
    assert!(receiver
        .receive_authorization_code(&request(), "no-such-handle")
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Access tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signed_access_token_applies_lifetime_defaults() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let claims = decode(&token);
    let nbf = claims.get("nbf").unwrap().as_i64().unwrap();
    let exp = claims.get("exp").unwrap().as_i64().unwrap();
    assert_eq!(nbf, fixed_now().timestamp());
    assert_eq!(exp, (fixed_now() + Duration::hours(1)).timestamp());
    assert!(exp > nbf);
}

#[tokio::test]
async fn caller_lifetimes_are_preserved() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let mut ticket = ticket_for("alice");
    ticket.properties.issued_at = Some(fixed_now() - Duration::minutes(1));
    ticket.properties.expires_at = Some(fixed_now() + Duration::minutes(30));

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let claims = decode(&token);
    assert_eq!(
        claims.get("nbf").unwrap().as_i64().unwrap(),
        (fixed_now() - Duration::minutes(1)).timestamp()
    );
    assert_eq!(
        claims.get("exp").unwrap().as_i64().unwrap(),
        (fixed_now() + Duration::minutes(30)).timestamp()
    );
}

#[tokio::test]
async fn destination_filter_separates_access_and_identity_claims() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new("sub", "bob"),
            Claim::new("email", "b@x").with_destination(destinations::IDENTITY_TOKEN),
            Claim::new("role", "admin").with_destination(destinations::ACCESS_TOKEN),
        ]),
        AuthProperties::new(),
    );

    let access_token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();
    let access_claims = decode(&access_token);
    assert_eq!(access_claims.get("sub").unwrap(), "bob");
    assert_eq!(access_claims.get("role").unwrap(), "admin");
    assert!(access_claims.get("email").is_none());

    let id_token = issuer
        .issue_identity_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();
    let id_claims = decode(&id_token);
    assert_eq!(id_claims.get("sub").unwrap(), "bob");
    assert_eq!(id_claims.get("email").unwrap(), "b@x");
    assert!(id_claims.get("role").is_none());
}

#[tokio::test]
async fn subject_is_substituted_from_name_identifier() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new(claim_types::NAME_IDENTIFIER, "carol"),
            Claim::new(claim_types::NAME_IDENTIFIER, "carol-dup"),
        ]),
        AuthProperties::new(),
    );

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let claims = decode(&token);
    assert_eq!(claims.get("sub").unwrap(), "carol");
    // Duplicate name identifiers collapse to one.
    assert!(claims.get(claim_types::NAME_IDENTIFIER).unwrap().is_string());
}

#[tokio::test]
async fn access_token_without_subject_fails() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    // No sub, no name identifier; the scoped claim alone is not enough.
    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new("role", "admin").with_destination(destinations::ACCESS_TOKEN)
        ]),
        AuthProperties::new(),
    );

    let result = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket)
        .await;
    assert!(matches!(result, Err(ServerError::MissingSubject)));
}

#[tokio::test]
async fn signed_access_token_carries_kid_and_jti() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let header = jsonwebtoken::decode_header(&token).unwrap();
    assert_eq!(header.kid.as_deref(), Some(KEY_ID));

    let claims = decode(&token);
    let jti = claims.get("jti").unwrap().as_str().unwrap();
    assert!(uuid::Uuid::parse_str(jti).is_ok());
}

#[tokio::test]
async fn access_token_audience_is_union_of_resources() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let request = TokenRequest {
        resources: vec!["https://api-1.example.com".to_string()],
        ..request()
    };
    let mut ticket = ticket_for("alice");
    ticket.properties.resources = vec![
        "https://api-1.example.com".to_string(),
        "https://api-2.example.com".to_string(),
    ];

    let token = issuer
        .issue_access_token(&request, &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let claims = decode(&token);
    assert_eq!(
        claims.get("aud").unwrap(),
        &serde_json::json!(["https://api-1.example.com", "https://api-2.example.com"])
    );
}

#[tokio::test]
async fn opaque_access_token_round_trips_filtered_view() {
    // No access token signer configured: the token is an opaque reference.
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new("sub", "bob"),
            Claim::new("role", "admin").with_destination(destinations::ACCESS_TOKEN),
            Claim::new("email", "b@x").with_destination(destinations::IDENTITY_TOKEN),
        ]),
        AuthProperties::new(),
    );

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let redeemed = receiver
        .receive_access_token(&request(), &token)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(redeemed.identity.find_first("sub").unwrap().value, "bob");
    assert_eq!(redeemed.identity.find_first("role").unwrap().value, "admin");
    assert!(!redeemed.identity.has_claim("email"));
    assert_eq!(redeemed.properties.issued_at, Some(fixed_now()));
    assert_eq!(
        redeemed.properties.expires_at,
        Some(fixed_now() + Duration::hours(1))
    );
}

#[tokio::test]
async fn signed_access_token_receive_restores_audiences() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let mut ticket = ticket_for("alice");
    ticket.properties.resources = vec![
        "https://api-1.example.com".to_string(),
        "https://api-2.example.com".to_string(),
    ];

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let redeemed = receiver
        .receive_access_token(&request(), &token)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        redeemed.properties.audiences,
        vec!["https://api-1.example.com", "https://api-2.example.com"]
    );
    assert_eq!(redeemed.properties.issued_at, Some(fixed_now()));
}

#[tokio::test]
async fn tampered_access_token_redeems_to_nothing() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let mut tampered = token;
    tampered.pop();
    assert!(receiver
        .receive_access_token(&request(), &tampered)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Identity tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identity_token_binds_code_and_access_token_hashes() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));

    let request = TokenRequest {
        nonce: Some("n1".to_string()),
        ..request()
    };

    let code = issuer
        .issue_authorization_code(&request, &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let response = TokenResponse {
        code: Some(code.clone()),
        access_token: Some("opaque-access-token".to_string()),
        ..TokenResponse::default()
    };

    let id_token = issuer
        .issue_identity_token(&request, &response, &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let claims = decode(&id_token);
    assert_eq!(
        claims.get("c_hash").unwrap(),
        &half_hash(Algorithm::RS256, &code)
    );
    assert_eq!(
        claims.get("at_hash").unwrap(),
        &half_hash(Algorithm::RS256, "opaque-access-token")
    );
    // Not an authorization_code grant: the nonce comes from the request.
    assert_eq!(claims.get("nonce").unwrap(), "n1");
    assert_eq!(claims.get("aud").unwrap(), "client-1");
    assert_eq!(
        claims.get("iat").unwrap().as_i64().unwrap(),
        fixed_now().timestamp()
    );
}

#[tokio::test]
async fn code_grant_restores_nonce_from_code_ticket() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(Arc::clone(&options));

    // Authorization request carried nonce=n2; it travels inside the code.
    let authorize_request = TokenRequest {
        nonce: Some("n2".to_string()),
        ..request()
    };
    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![Claim::new("sub", "alice")]),
        AuthProperties::new().with_nonce("n2"),
    );
    let code = issuer
        .issue_authorization_code(&authorize_request, &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    // The token request has no nonce parameter of its own.
    let token_request = TokenRequest {
        grant_type: grant_types::AUTHORIZATION_CODE.to_string(),
        client_id: Some("client-1".to_string()),
        nonce: None,
        ..TokenRequest::default()
    };
    let redeemed = receiver
        .receive_authorization_code(&token_request, &code)
        .await
        .unwrap()
        .unwrap();

    let id_token = issuer
        .issue_identity_token(&token_request, &TokenResponse::default(), &redeemed)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(decode(&id_token).get("nonce").unwrap(), "n2");
}

#[tokio::test]
async fn code_grant_ignores_request_nonce() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(options);

    let token_request = TokenRequest {
        grant_type: grant_types::AUTHORIZATION_CODE.to_string(),
        client_id: Some("client-1".to_string()),
        nonce: Some("attacker-nonce".to_string()),
        ..TokenRequest::default()
    };
    // Ticket as it came out of the code, with the original nonce.
    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![Claim::new("sub", "alice")]),
        AuthProperties::new().with_nonce("original"),
    );

    let id_token = issuer
        .issue_identity_token(&token_request, &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(decode(&id_token).get("nonce").unwrap(), "original");
}

#[tokio::test]
async fn identity_token_without_subject_fails() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(options);

    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![Claim::new("email", "a@x")
            .with_destination(destinations::IDENTITY_TOKEN)]),
        AuthProperties::new(),
    );

    let result = issuer
        .issue_identity_token(&request(), &TokenResponse::default(), &ticket)
        .await;
    assert!(matches!(result, Err(ServerError::MissingSubject)));
}

#[tokio::test]
async fn identity_token_receive_restores_claims_and_audience() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new("sub", "alice"),
            Claim::new("email", "alice@example.com").with_destination(destinations::IDENTITY_TOKEN),
        ]),
        AuthProperties::new(),
    );

    let id_token = issuer
        .issue_identity_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let redeemed = receiver
        .receive_identity_token(&request(), &id_token)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(redeemed.identity.find_first("sub").unwrap().value, "alice");
    assert_eq!(
        redeemed.identity.find_first("email").unwrap().value,
        "alice@example.com"
    );
    assert_eq!(redeemed.properties.audiences, vec!["client-1"]);
    assert_eq!(redeemed.properties.issued_at, Some(fixed_now()));
    assert_eq!(
        redeemed.properties.expires_at,
        Some(fixed_now() + Duration::hours(1))
    );
}

#[tokio::test]
async fn identity_token_disabled_without_signer() {
    let options = Arc::new(
        gatehouse_server::ServerOptions::builder(ISSUER)
            .protection_key(&[0x42u8; 32])
            .clock(Arc::new(gatehouse_core::FixedClock(fixed_now())))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let result = issuer
        .issue_identity_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Refresh tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_token_round_trips_full_identity() {
    let options = Arc::new(options_builder().build().unwrap());
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let mut ticket = AuthTicket::new(
        ClaimsIdentity::new(vec![
            Claim::new("sub", "alice"),
            Claim::new("email", "alice@example.com").with_destination(destinations::IDENTITY_TOKEN),
        ]),
        AuthProperties::new(),
    );
    ticket.properties.insert_extra("device", "laptop");

    let token = issuer
        .issue_refresh_token(&request(), &TokenResponse::default(), &ticket)
        .await
        .unwrap()
        .unwrap();

    let redeemed = receiver
        .receive_refresh_token(&request(), &token)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(redeemed.identity, ticket.identity);
    assert_eq!(redeemed.properties.get_extra("device"), Some("laptop"));
    assert_eq!(
        redeemed.properties.expires_at,
        Some(fixed_now() + Duration::days(14))
    );

    // Refresh tokens are not single-use references: a second redemption
    // of the same value still works.
    assert!(receiver
        .receive_refresh_token(&request(), &token)
        .await
        .unwrap()
        .is_some());
}

// ---------------------------------------------------------------------------
// Provider decisions
// ---------------------------------------------------------------------------

struct HandlingProvider;

#[async_trait]
impl ServerProvider for HandlingProvider {
    async fn create_authorization_code(
        &self,
        _ctx: &mut IssueContext<'_>,
    ) -> EventDecision<String> {
        EventDecision::handled("provider-code")
    }
}

#[tokio::test]
async fn provider_supplied_code_bypasses_the_cache() {
    let options = Arc::new(
        options_builder()
            .provider(Arc::new(HandlingProvider))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(Arc::clone(&options));

    let code = issuer
        .issue_authorization_code(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap();
    assert_eq!(code.as_deref(), Some("provider-code"));

    // The default receive path consults the cache, which was never written.
    let receiver = TokenReceiver::new(options);
    assert!(receiver
        .receive_authorization_code(&request(), "provider-code")
        .await
        .unwrap()
        .is_none());
}

struct SkippingProvider;

#[async_trait]
impl ServerProvider for SkippingProvider {
    async fn create_access_token(&self, _ctx: &mut IssueContext<'_>) -> EventDecision<String> {
        EventDecision::Skip
    }
}

#[tokio::test]
async fn provider_skip_yields_no_credential() {
    let options = Arc::new(
        options_builder()
            .provider(Arc::new(SkippingProvider))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap();
    assert!(token.is_none());
}

struct SerializingProvider;

#[async_trait]
impl ServerProvider for SerializingProvider {
    async fn create_access_token(&self, ctx: &mut IssueContext<'_>) -> EventDecision<String> {
        // Run the default serialization, then take over with its output.
        match ctx.serialize().await {
            Ok(token) => EventDecision::handled(token),
            Err(_) => EventDecision::Skip,
        }
    }
}

#[tokio::test]
async fn provider_can_run_the_bound_serializer() {
    let options = Arc::new(
        options_builder()
            .access_token_signer(signer())
            .provider(Arc::new(SerializingProvider))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let token = issuer
        .issue_access_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .expect("provider produced a token");

    // The provider-supplied string is the real default serialization.
    assert_eq!(decode(&token).get("sub").unwrap(), "alice");
}

struct DeserializingProvider;

#[async_trait]
impl ServerProvider for DeserializingProvider {
    async fn receive_refresh_token(
        &self,
        ctx: &mut ReceiveContext<'_>,
    ) -> EventDecision<AuthTicket> {
        match ctx.deserialize(ctx.value).await {
            Ok(ticket) => EventDecision::Handled(ticket),
            Err(_) => EventDecision::Skip,
        }
    }
}

#[tokio::test]
async fn provider_can_run_the_bound_deserializer() {
    let options = Arc::new(
        options_builder()
            .provider(Arc::new(DeserializingProvider))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(Arc::clone(&options));
    let receiver = TokenReceiver::new(options);

    let token = issuer
        .issue_refresh_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await
        .unwrap()
        .unwrap();

    let redeemed = receiver
        .receive_refresh_token(&request(), &token)
        .await
        .unwrap()
        .expect("provider rehydrated the ticket");
    assert_eq!(redeemed.identity.find_first("sub").unwrap().value, "alice");
}

struct RejectingProvider;

#[async_trait]
impl ServerProvider for RejectingProvider {
    async fn create_refresh_token(&self, _ctx: &mut IssueContext<'_>) -> EventDecision<String> {
        EventDecision::Reject(ProtocolError {
            error: "unauthorized_client".to_string(),
            error_description: Some("offline access is not allowed".to_string()),
            error_uri: None,
        })
    }
}

#[tokio::test]
async fn provider_rejection_propagates_verbatim() {
    let options = Arc::new(
        options_builder()
            .provider(Arc::new(RejectingProvider))
            .build()
            .unwrap(),
    );
    let issuer = TokenIssuer::new(options);

    let result = issuer
        .issue_refresh_token(&request(), &TokenResponse::default(), &ticket_for("alice"))
        .await;
    match result {
        Err(ServerError::Rejected(error)) => {
            assert_eq!(error.error, "unauthorized_client");
            assert_eq!(
                error.error_description.as_deref(),
                Some("offline access is not allowed")
            );
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}
