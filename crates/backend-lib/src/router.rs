// ============================
// luxe-backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, auth};
use crate::middleware::{require_admin, require_auth};
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let me = protected(Router::new().route("/me", get(auth::me)), &state);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/login/admin", post(auth::login_admin))
        .route("/logout", post(auth::logout))
        .route("/google", get(auth::google_start))
        .route("/google/callback", get(auth::google_callback))
        .merge(me);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/auth", auth_routes)
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Put every route of `router` behind the identity resolver
pub fn protected(router: Router<Arc<AppState>>, state: &Arc<AppState>) -> Router<Arc<AppState>> {
    router.route_layer(from_fn_with_state(Arc::clone(state), require_auth))
}

/// Put every route of `router` behind the identity resolver and the role gate
pub fn admin_only(router: Router<Arc<AppState>>, state: &Arc<AppState>) -> Router<Arc<AppState>> {
    // the last layer added runs first
    router
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(Arc::clone(state), require_auth))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(&state.settings.cors_origin()) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "frontend origin is not a valid header value, CORS disabled");
            layer
        },
    }
}
