// ============================
// luxe-backend-lib/src/auth/federation.rs
// ============================
//! Federated identity bridge.
//!
//! Turns a provider callback into a [`FederatedOutcome`]. Building the
//! browser redirect from that outcome is a pure function, [`redirect_for`].
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::service::{AuthService, Session};
use super::token_generator::{generate_secure_token, tokens_match};

/// Identity asserted by an external provider after it verified the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider subject id
    pub subject: String,
    pub email: String,
    pub name: String,
}

/// Identity provider failures
#[derive(Debug, Error)]
pub enum FederationError {
    #[error("identity provider request failed: {0}")]
    Provider(String),

    #[error("email address is not verified by the provider")]
    UnverifiedEmail,

    #[error("identity provider response lacks '{0}'")]
    MissingField(&'static str),
}

/// An OAuth 2.0 / OpenID Connect authorization-code provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start sign-in
    fn authorization_url(&self, state: &str) -> Url;

    /// Redeem an authorization code for a verified identity
    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, FederationError>;
}

/// Query string of the provider callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Why a federated sign-in did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No provider is configured
    NotConfigured,
    /// The user or the provider refused the request
    ProviderDenied,
    MissingCode,
    /// State cookie absent or different from the callback's state
    StateMismatch,
    /// Code exchange or profile fetch failed
    ProviderError,
    /// The local account could not be found or created
    AccountError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::ProviderDenied => "provider_denied",
            Self::MissingCode => "missing_code",
            Self::StateMismatch => "state_mismatch",
            Self::ProviderError => "provider_error",
            Self::AccountError => "account_error",
        }
    }
}

/// Result of a provider callback
#[derive(Debug)]
pub enum FederatedOutcome {
    Authenticated(Session),
    Failed(FailureReason),
}

/// Frontend location to send the browser to after a callback.
///
/// Success goes to `/auth/success` and failure to `/login?error=<reason>`,
/// both relative to `frontend_url`. The session token never appears here.
pub fn redirect_for(outcome: &FederatedOutcome, frontend_url: &Url) -> Url {
    let mut url = frontend_url.clone();
    url.set_query(None);
    url.set_fragment(None);

    match outcome {
        FederatedOutcome::Authenticated(_) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push("auth").push("success");
            }
        },
        FederatedOutcome::Failed(reason) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push("login");
            }
            url.query_pairs_mut().append_pair("error", reason.as_str());
        },
    }
    url
}

/// Binds an identity provider to the auth core
#[derive(Clone)]
pub struct FederatedBridge {
    provider: Arc<dyn IdentityProvider>,
    auth: Arc<AuthService>,
}

impl FederatedBridge {
    pub fn new(provider: Arc<dyn IdentityProvider>, auth: Arc<AuthService>) -> Self {
        Self { provider, auth }
    }

    /// Fresh state value and the provider URL carrying it
    pub fn begin(&self) -> (String, Url) {
        let state = generate_secure_token();
        let url = self.provider.authorization_url(&state);
        (state, url)
    }

    /// Finish sign-in. `expected_state` is the value from the state cookie.
    pub async fn complete(
        &self,
        params: CallbackParams,
        expected_state: Option<&str>,
    ) -> FederatedOutcome {
        let state_ok = match (expected_state, params.state.as_deref()) {
            (Some(expected), Some(provided)) => tokens_match(expected, provided),
            _ => false,
        };
        if !state_ok {
            tracing::warn!("federated callback with missing or mismatched state");
            return FederatedOutcome::Failed(FailureReason::StateMismatch);
        }

        if let Some(error) = params.error {
            tracing::info!(%error, "identity provider denied sign-in");
            return FederatedOutcome::Failed(FailureReason::ProviderDenied);
        }

        let Some(code) = params.code.filter(|c| !c.is_empty()) else {
            return FederatedOutcome::Failed(FailureReason::MissingCode);
        };

        let identity = match self.provider.exchange_code(&code).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "authorization code exchange failed");
                return FederatedOutcome::Failed(FailureReason::ProviderError);
            },
        };

        match self.auth.sign_in_federated(identity).await {
            Ok(session) => FederatedOutcome::Authenticated(session),
            Err(e) => {
                tracing::error!(error = %e, "federated account lookup failed");
                FederatedOutcome::Failed(FailureReason::AccountError)
            },
        }
    }
}
