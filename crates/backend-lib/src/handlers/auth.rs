// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Handlers for the `/auth` routes.
//!
//! Session tokens travel only in the `token` cookie; response bodies carry
//! the `{ success, message }` envelope and never the token.
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Redirect,
    Json,
};
use axum_extra::extract::CookieJar;
use luxe_common::{ApiResponse, LoginRequest, RegisterRequest, UserResponse};

use crate::auth::{
    redirect_for, CallbackParams, FailureReason, FederatedOutcome, Session, OAUTH_STATE_COOKIE,
};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

type CookieResponse = (CookieJar, Json<ApiResponse>);

fn signed_in(state: &AppState, jar: CookieJar, session: Session, message: &str) -> CookieResponse {
    (
        jar.add(state.cookies.session_cookie(session.token)),
        Json(ApiResponse::ok(message)),
    )
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<CookieResponse, AppError> {
    let Json(req) = payload?;
    let session = state.auth.register(req).await?;
    Ok(signed_in(&state, jar, session, "Registration Successfully"))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<CookieResponse, AppError> {
    let Json(req) = payload?;
    let session = state.auth.login(req).await?;
    Ok(signed_in(&state, jar, session, "Login Successfully"))
}

/// `POST /auth/login/admin`
pub async fn login_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<CookieResponse, AppError> {
    let Json(req) = payload?;
    let session = state.auth.login_admin(req).await?;
    Ok(signed_in(&state, jar, session, "Login Successfully"))
}

/// `POST /auth/logout`. Succeeds with or without a session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> CookieResponse {
    (
        jar.add(state.cookies.clear_session_cookie()),
        Json(ApiResponse::ok("Logout Successfully")),
    )
}

/// `GET /auth/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user,
    })
}

/// `GET /auth/google`: send the browser to the provider
pub async fn google_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let bridge = state
        .federation
        .as_ref()
        .ok_or(AppError::NotConfigured("Google sign-in"))?;

    let (oauth_state, url) = bridge.begin();
    Ok((
        jar.add(state.cookies.oauth_state_cookie(oauth_state)),
        Redirect::to(url.as_str()),
    ))
}

/// `GET /auth/google/callback`: always answers with a redirect to the frontend
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> (CookieJar, Redirect) {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());

    let outcome = match &state.federation {
        Some(bridge) => bridge.complete(params, expected_state.as_deref()).await,
        None => FederatedOutcome::Failed(FailureReason::NotConfigured),
    };

    let mut jar = jar.add(state.cookies.clear_oauth_state_cookie());
    if let FederatedOutcome::Authenticated(session) = &outcome {
        jar = jar.add(state.cookies.session_cookie(session.token.clone()));
    }

    let target = redirect_for(&outcome, &state.settings.frontend_url);
    (jar, Redirect::to(target.as_str()))
}
