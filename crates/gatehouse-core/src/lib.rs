//! Core credential types for the gatehouse authorization server.
//!
//! This crate provides:
//! - Claims with destination sets, and the per-credential filter policies
//! - Identities with delegated-actor chains
//! - Authentication properties (lifetimes, nonce, resources, audiences)
//! - The authentication ticket bundled into every issued credential
//! - A clock abstraction for deterministic tests
//!
//! # Example
//!
//! ```rust
//! use gatehouse_core::{AuthProperties, AuthTicket, Claim, ClaimsIdentity, CredentialKind};
//! use gatehouse_core::claims::destinations;
//!
//! let identity = ClaimsIdentity::new(vec![
//!     Claim::new("sub", "alice"),
//!     Claim::new("email", "alice@example.com").with_destination(destinations::IDENTITY_TOKEN),
//! ]);
//!
//! let ticket = AuthTicket::new(identity, AuthProperties::new());
//! let filtered = ticket
//!     .identity
//!     .clone_filtered(|c| CredentialKind::AccessToken.retains(c));
//!
//! // `sub` survives every filter; the id_token-scoped email does not.
//! assert_eq!(filtered.claims.len(), 1);
//! ```

pub mod claims;
pub mod clock;
pub mod identity;
pub mod properties;
pub mod ticket;

pub use claims::{Claim, CredentialKind};
pub use clock::{FixedClock, SystemClock, UtcClock};
pub use identity::ClaimsIdentity;
pub use properties::AuthProperties;
pub use ticket::AuthTicket;
