// ============================
// luxe-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod cookies;
pub mod federation;
pub mod google;
pub mod password;
pub mod token;
pub mod token_generator;
mod service;

pub use cookies::{CookiePolicy, OAUTH_STATE_COOKIE, SESSION_COOKIE};
pub use federation::{
    redirect_for, CallbackParams, ExternalIdentity, FailureReason, FederatedBridge,
    FederatedOutcome, FederationError, IdentityProvider,
};
pub use google::GoogleProvider;
pub use password::{PasswordError, PasswordHasher};
pub use service::{AuthService, Session};
pub use token::{Claims, TokenError, TokenIssuer};
