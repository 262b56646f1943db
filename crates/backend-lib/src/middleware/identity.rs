// ============================
// luxe-backend-lib/src/middleware/identity.rs
// ============================
//! Identity resolver: turns the session cookie into a [`CurrentUser`].
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use luxe_common::PublicUser;
use metrics::counter;

use crate::auth::SESSION_COOKIE;
use crate::error::AppError;
use crate::metrics::AUTH_UNAUTHENTICATED;
use crate::AppState;

/// The user behind the current request, attached by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.0.role.is_admin()
    }
}

/// Reject the request with 401 unless it carries a valid session cookie
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty());

    let Some(token) = token else {
        counter!(AUTH_UNAUTHENTICATED).increment(1);
        return Err(AppError::Unauthenticated);
    };

    let user = match state.auth.resolve(token).await {
        Ok(user) => user,
        Err(e) => {
            if matches!(e, AppError::Unauthenticated) {
                counter!(AUTH_UNAUTHENTICATED).increment(1);
            }
            return Err(e);
        },
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
