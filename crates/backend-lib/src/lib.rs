// ============================
// luxe-backend-lib/src/lib.rs
// ============================
//! Authentication and account backend for the Luxe rental marketplace.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, CookiePolicy, FederatedBridge, GoogleProvider, IdentityProvider};
use crate::config::Settings;
use crate::error::AppError;
use crate::store::UserStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<AuthService>,
    /// Immutable settings
    pub settings: Arc<Settings>,
    /// Cookie attributes for the deployment mode
    pub cookies: CookiePolicy,
    /// Federated sign-in, when a provider is configured
    pub federation: Option<FederatedBridge>,
}

impl AppState {
    /// Create a new application state. Google sign-in is enabled when
    /// `settings.google` is present.
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Result<Self, AppError> {
        let auth = Arc::new(AuthService::new(store, &settings)?);
        let cookies = CookiePolicy::new(settings.mode, settings.session_ttl());

        let federation = match &settings.google {
            Some(google) => {
                let provider = GoogleProvider::new(google.clone())
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                Some(FederatedBridge::new(Arc::new(provider), Arc::clone(&auth)))
            },
            None => None,
        };

        Ok(Self {
            auth,
            settings: Arc::new(settings),
            cookies,
            federation,
        })
    }

    /// Replace the identity provider, e.g. with a local stand-in
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.federation = Some(FederatedBridge::new(provider, Arc::clone(&self.auth)));
        self
    }
}
