// ============================================================================
// Users Routes
// ============================================================================
//
// Endpoints:
// - GET /users - List all user profiles
// - GET /users/:username - Fetch one user's profile
// - GET /users/:username/from - Messages the user has sent
// - GET /users/:username/to - Messages the user has received
//
// Message history is private: /from and /to answer only for the
// authenticated user's own username.
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;
use crate::db;
use crate::error::AppError;
use crate::routes::extractors::AuthenticatedUser;

/// GET /users
/// Basic profile info on all users
pub async fn list_users(
    State(app_context): State<Arc<AppContext>>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = db::list_users(&app_context.db_pool).await?;
    Ok((StatusCode::OK, Json(json!({ "users": users }))))
}

/// GET /users/:username
/// One user's profile with join/last-login timestamps
pub async fn get_user(
    State(app_context): State<Arc<AppContext>>,
    _user: AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = db::get_user_detail(&app_context.db_pool, &username)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok((StatusCode::OK, Json(json!({ "user": user }))))
}

fn require_self(requester: &str, username: &str) -> Result<(), AppError> {
    if requester != username {
        tracing::warn!(
            username = %requester,
            requested = %username,
            "Attempted to read another user's message history"
        );
        return Err(AppError::auth("Cannot view another user's messages"));
    }
    Ok(())
}

/// GET /users/:username/from
/// Messages sent by the user, oldest first, recipient profile embedded
pub async fn messages_from(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_self(&user.0, &username)?;

    let messages = db::messages_from(&app_context.db_pool, &username).await?;
    Ok((StatusCode::OK, Json(json!({ "messages": messages }))))
}

/// GET /users/:username/to
/// Messages received by the user, oldest first, sender profile embedded
pub async fn messages_to(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_self(&user.0, &username)?;

    let messages = db::messages_to(&app_context.db_pool, &username).await?;
    Ok((StatusCode::OK, Json(json!({ "messages": messages }))))
}
