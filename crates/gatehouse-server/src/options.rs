//! Server options: lifetimes, formats, signers, and injected services.

use std::sync::Arc;

use chrono::Duration;

use gatehouse_core::{SystemClock, UtcClock};
use gatehouse_jose::{AesGcmDataFormat, DataFormat, JwsSigner, SigningCredentials};

use crate::cache::{InMemorySingleUseCache, SingleUseCache};
use crate::error::ServerError;
use crate::events::{DefaultProvider, ServerProvider};

/// Assembled configuration shared by the pipelines.
///
/// Construct through [`ServerOptions::builder`]. The instance is read-only
/// after construction; key rotation is done by building fresh options and
/// swapping the `Arc`.
pub struct ServerOptions {
    /// Issuer identifier stamped into and required of every JWS.
    pub issuer: String,

    /// Default authorization code lifetime.
    pub authorization_code_lifetime: Duration,

    /// Default access token lifetime.
    pub access_token_lifetime: Duration,

    /// Default identity token lifetime.
    pub identity_token_lifetime: Duration,

    /// Default refresh token lifetime.
    pub refresh_token_lifetime: Duration,

    /// Opaque format protecting authorization code tickets.
    pub authorization_code_format: Arc<dyn DataFormat>,

    /// Opaque format protecting access token tickets when no access token
    /// signer is configured.
    pub access_token_format: Arc<dyn DataFormat>,

    /// Opaque format protecting refresh token tickets.
    pub refresh_token_format: Arc<dyn DataFormat>,

    /// When set, access tokens are self-contained JWS instead of opaque.
    pub access_token_signer: Option<Arc<JwsSigner>>,

    /// Signer for identity tokens; identity-token issuance is disabled
    /// without one.
    pub identity_token_signer: Option<Arc<JwsSigner>>,

    /// Host extension point dispatched at every stage.
    pub provider: Arc<dyn ServerProvider>,

    /// Time source for lifetime stamping and cache expiry.
    pub clock: Arc<dyn SystemClock>,

    /// Single-use store backing authorization codes.
    pub cache: Arc<dyn SingleUseCache>,

    /// When true, a logout error is handed back to the application for
    /// rendering instead of the built-in error page.
    pub application_can_display_errors: bool,
}

impl ServerOptions {
    /// Start building options for the given issuer.
    #[must_use]
    pub fn builder(issuer: impl Into<String>) -> ServerOptionsBuilder {
        ServerOptionsBuilder::new(issuer)
    }
}

/// Builder for [`ServerOptions`].
pub struct ServerOptionsBuilder {
    issuer: String,
    authorization_code_lifetime: Duration,
    access_token_lifetime: Duration,
    identity_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
    protection_key: Option<Vec<u8>>,
    authorization_code_format: Option<Arc<dyn DataFormat>>,
    access_token_format: Option<Arc<dyn DataFormat>>,
    refresh_token_format: Option<Arc<dyn DataFormat>>,
    access_token_signer: Option<Arc<JwsSigner>>,
    identity_token_signer: Option<Arc<JwsSigner>>,
    signing_credentials: Vec<SigningCredentials>,
    provider: Option<Arc<dyn ServerProvider>>,
    clock: Option<Arc<dyn SystemClock>>,
    cache: Option<Arc<dyn SingleUseCache>>,
    application_can_display_errors: bool,
}

impl ServerOptionsBuilder {
    fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            authorization_code_lifetime: Duration::minutes(5),
            access_token_lifetime: Duration::hours(1),
            identity_token_lifetime: Duration::hours(1),
            refresh_token_lifetime: Duration::days(14),
            protection_key: None,
            authorization_code_format: None,
            access_token_format: None,
            refresh_token_format: None,
            access_token_signer: None,
            identity_token_signer: None,
            signing_credentials: Vec::new(),
            provider: None,
            clock: None,
            cache: None,
            application_can_display_errors: false,
        }
    }

    /// 32-byte secret used to key the default AES-GCM format for every
    /// opaque kind not given an explicit format.
    #[must_use]
    pub fn protection_key(mut self, key: &[u8]) -> Self {
        self.protection_key = Some(key.to_vec());
        self
    }

    /// Override the authorization code format.
    #[must_use]
    pub fn authorization_code_format(mut self, format: Arc<dyn DataFormat>) -> Self {
        self.authorization_code_format = Some(format);
        self
    }

    /// Override the opaque access token format.
    #[must_use]
    pub fn access_token_format(mut self, format: Arc<dyn DataFormat>) -> Self {
        self.access_token_format = Some(format);
        self
    }

    /// Override the refresh token format.
    #[must_use]
    pub fn refresh_token_format(mut self, format: Arc<dyn DataFormat>) -> Self {
        self.refresh_token_format = Some(format);
        self
    }

    /// Ordered signing credentials; builds the identity-token signer, with
    /// the first entry active.
    #[must_use]
    pub fn signing_credentials(mut self, credentials: Vec<SigningCredentials>) -> Self {
        self.signing_credentials = credentials;
        self
    }

    /// Emit access tokens as JWS signed by this signer.
    #[must_use]
    pub fn access_token_signer(mut self, signer: Arc<JwsSigner>) -> Self {
        self.access_token_signer = Some(signer);
        self
    }

    /// Sign identity tokens with this signer instead of one built from
    /// [`Self::signing_credentials`].
    #[must_use]
    pub fn identity_token_signer(mut self, signer: Arc<JwsSigner>) -> Self {
        self.identity_token_signer = Some(signer);
        self
    }

    /// Set the authorization code lifetime.
    #[must_use]
    pub fn authorization_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.authorization_code_lifetime = lifetime;
        self
    }

    /// Set the access token lifetime.
    #[must_use]
    pub fn access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Set the identity token lifetime.
    #[must_use]
    pub fn identity_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.identity_token_lifetime = lifetime;
        self
    }

    /// Set the refresh token lifetime.
    #[must_use]
    pub fn refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime;
        self
    }

    /// Install the host provider.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn ServerProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Inject a clock (tests pin a `FixedClock` here).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn SystemClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Inject a single-use cache implementation.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn SingleUseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Let the application render logout error pages itself.
    #[must_use]
    pub fn application_can_display_errors(mut self, value: bool) -> Self {
        self.application_can_display_errors = value;
        self
    }

    /// Assemble the options.
    pub fn build(self) -> Result<ServerOptions, ServerError> {
        if self.issuer.is_empty() {
            return Err(ServerError::Configuration(
                "issuer must not be empty".to_string(),
            ));
        }

        let default_format: Option<Arc<dyn DataFormat>> = match self.protection_key {
            Some(ref key) => Some(Arc::new(AesGcmDataFormat::new(key)?)),
            None => None,
        };
        let resolve_format = |explicit: Option<Arc<dyn DataFormat>>, kind: &str| {
            explicit.or_else(|| default_format.clone()).ok_or_else(|| {
                ServerError::Configuration(format!(
                    "no data format for {kind}: set one explicitly or provide a protection key"
                ))
            })
        };

        let identity_token_signer = match (self.identity_token_signer, self.signing_credentials) {
            (Some(signer), _) => Some(signer),
            (None, credentials) if !credentials.is_empty() => {
                Some(Arc::new(JwsSigner::new(credentials)?))
            }
            _ => None,
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(UtcClock));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemorySingleUseCache::new(Arc::clone(&clock))));

        Ok(ServerOptions {
            issuer: self.issuer,
            authorization_code_lifetime: self.authorization_code_lifetime,
            access_token_lifetime: self.access_token_lifetime,
            identity_token_lifetime: self.identity_token_lifetime,
            refresh_token_lifetime: self.refresh_token_lifetime,
            authorization_code_format: resolve_format(
                self.authorization_code_format,
                "authorization codes",
            )?,
            access_token_format: resolve_format(self.access_token_format, "access tokens")?,
            refresh_token_format: resolve_format(self.refresh_token_format, "refresh tokens")?,
            access_token_signer: self.access_token_signer,
            identity_token_signer,
            provider: self.provider.unwrap_or_else(|| Arc::new(DefaultProvider)),
            clock,
            cache,
            application_can_display_errors: self.application_can_display_errors,
        })
    }
}
