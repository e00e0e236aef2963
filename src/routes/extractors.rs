// ============================================================================
// Axum Extractors
// ============================================================================
//
// AuthenticatedUser: extracts and validates the session token from the
// Authorization header. Handlers taking this parameter are reachable only
// with a valid token; the embedded username is trusted for the remainder
// of request handling.
//
// ============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::context::AppContext;
use crate::error::AppError;

/// Authenticated username taken from a verified session token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::auth("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth("Invalid Authorization header format"))?;

        let claims = state.auth_manager.verify_token(token).map_err(|e| {
            tracing::warn!(error = %e, "Session token verification failed");
            AppError::auth("Invalid or expired token")
        })?;

        Ok(AuthenticatedUser(claims.sub))
    }
}
