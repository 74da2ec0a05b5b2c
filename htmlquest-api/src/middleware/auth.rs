/// Authentication layers for the router
///
/// `jwt_auth_layer` validates the bearer token and inserts the caller's
/// [`AuthContext`]; `require_admin` must run after it.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use htmlquest_shared::auth::{
    authorization::require_role,
    middleware::{authenticate, AuthContext},
};
use htmlquest_shared::models::user::UserRole;

use crate::{app::AppState, error::ApiError};

/// Extracts and validates the JWT, then injects `AuthContext` into request
/// extensions.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Rejects callers whose role is not `admin`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    if let Err(e) = require_role(&auth, UserRole::Admin) {
        tracing::warn!(user_id = %auth.user_id, role = auth.role.as_str(), "Admin route refused");
        return Err(e.into());
    }

    Ok(next.run(req).await)
}
