// ============================
// luxe-backend-lib/src/middleware/role_gate.rs
// ============================
//! Role gate for admin-only routes.
use axum::{extract::Request, middleware::Next, response::Response};
use metrics::counter;

use super::identity::CurrentUser;
use crate::error::AppError;
use crate::metrics::{AUTH_FORBIDDEN, AUTH_UNAUTHENTICATED};

/// True iff the resolved user is an admin
pub fn is_admin(user: Option<&CurrentUser>) -> bool {
    user.is_some_and(CurrentUser::is_admin)
}

/// Must run inside [`super::require_auth`]. A request that reaches it
/// without an identity is still a 401, never a 403.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request.extensions().get::<CurrentUser>();
    if user.is_none() {
        counter!(AUTH_UNAUTHENTICATED).increment(1);
        return Err(AppError::Unauthenticated);
    }
    if !is_admin(user) {
        counter!(AUTH_FORBIDDEN).increment(1);
        tracing::debug!("non-admin request to admin route");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
