// ============================
// luxe-backend-lib/src/auth/cookies.rs
// ============================
//! Session and OAuth state cookies.
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::DeploymentMode;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Name of the short-lived cookie binding an OAuth round trip to a browser
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Lifetime of the OAuth state cookie
pub const OAUTH_STATE_TTL_SECS: i64 = 600;

/// Attributes shared by every cookie this service sets
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    secure: bool,
    same_site: SameSite,
    session_max_age: time::Duration,
}

impl CookiePolicy {
    /// Production cookies are `Secure` and `SameSite=Strict`; development
    /// cookies are `SameSite=Lax` so a plain-http frontend keeps working.
    pub fn new(mode: DeploymentMode, session_ttl: chrono::Duration) -> Self {
        let (secure, same_site) = if mode.is_production() {
            (true, SameSite::Strict)
        } else {
            (false, SameSite::Lax)
        };
        Self {
            secure,
            same_site,
            session_max_age: time::Duration::seconds(session_ttl.num_seconds()),
        }
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/")
            .max_age(self.session_max_age)
            .build()
    }

    /// Expired, empty session cookie with matching attributes
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new());
        cookie.make_removal();
        cookie
    }

    /// The state cookie must survive the cross-site redirect back from the
    /// provider, so it is always `Lax`.
    pub fn oauth_state_cookie(&self, state: String) -> Cookie<'static> {
        Cookie::build((OAUTH_STATE_COOKIE, state))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/auth/google")
            .max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECS))
            .build()
    }

    pub fn clear_oauth_state_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.oauth_state_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}
