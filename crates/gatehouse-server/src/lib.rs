//! Token lifecycle core for the gatehouse authorization server.
//!
//! This crate mints and re-hydrates the four credential kinds an OAuth
//! 2.0 / OIDC authorization server exchanges with its relying parties —
//! authorization codes, access tokens, identity tokens, and refresh
//! tokens — and drives the end-session (logout) pipeline under the same
//! provider discipline.
//!
//! The outer HTTP front-end is out of scope: the host parses requests,
//! calls into [`TokenIssuer`] / [`TokenReceiver`] / [`LogoutPipeline`],
//! and writes the results back. Every stage dispatches the host
//! [`ServerProvider`], which can take over, opt out, or reject before the
//! built-in behavior runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gatehouse_core::{AuthProperties, AuthTicket, Claim, ClaimsIdentity};
//! use gatehouse_server::{ServerOptions, TokenIssuer, TokenReceiver};
//! use gatehouse_server::models::{TokenRequest, TokenResponse};
//!
//! let options = Arc::new(
//!     ServerOptions::builder("https://idp.example.com")
//!         .protection_key(&secret)
//!         .signing_credentials(vec![credentials])
//!         .build()?,
//! );
//!
//! let issuer = TokenIssuer::new(Arc::clone(&options));
//! let ticket = AuthTicket::new(
//!     ClaimsIdentity::new(vec![Claim::new("sub", "alice")]),
//!     AuthProperties::new(),
//! );
//! let code = issuer
//!     .issue_authorization_code(&request, &TokenResponse::default(), &ticket)
//!     .await?;
//!
//! // Later, at the token endpoint: single-use redemption.
//! let receiver = TokenReceiver::new(options);
//! let redeemed = receiver
//!     .receive_authorization_code(&request, &code.unwrap())
//!     .await?;
//! ```

pub mod cache;
pub mod error;
pub mod events;
pub mod logout;
pub mod models;
pub mod options;
pub mod serializer;
mod services;

pub use cache::{InMemorySingleUseCache, SingleUseCache};
pub use error::{ErrorCode, ProtocolError, ServerError};
pub use events::{
    DefaultProvider, EventDecision, IssueContext, LogoutContext, LogoutResponseContext,
    ReceiveContext, ServerProvider,
};
pub use logout::{LogoutDisposition, LogoutPipeline};
pub use options::{ServerOptions, ServerOptionsBuilder};
pub use serializer::{JwsTicketSerializer, OpaqueTicketSerializer, TicketSerializer};
pub use services::{TokenIssuer, TokenReceiver};
