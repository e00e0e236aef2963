// ============================================================================
// Authentication Routes
// ============================================================================
//
// Endpoints:
// - POST /login - Verify credentials, issue a session token
// - POST /register - Create an account, issue a session token
//
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;
use crate::db::{self, NewUser};
use crate::error::AppError;

/// Request body for login. Fields are optional so that missing input is
/// reported as a 400 validation failure rather than a body-rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

fn present(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// POST /login
/// Verifies username/password, updates the last-login timestamp, and
/// returns a session token
pub async fn login(
    State(app_context): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (username, password) = match (present(&request.username), present(&request.password)) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(AppError::validation("Username and Password required"));
        }
    };

    if !db::authenticate(&app_context.db_pool, &username, &password).await? {
        tracing::warn!(username = %username, "Login rejected");
        return Err(AppError::InvalidCredentials(
            "Invalid username/password".to_string(),
        ));
    }

    // Fire-and-forget: a failed timestamp update must not block the login
    if let Err(e) = db::touch_last_login(&app_context.db_pool, &username).await {
        tracing::warn!(error = %e, username = %username, "Failed to update last-login timestamp");
    }

    let token = app_context
        .auth_manager
        .create_token(&username)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create session token");
            AppError::Internal(e.to_string())
        })?;

    tracing::info!(username = %username, "User logged in");

    Ok((
        StatusCode::OK,
        Json(json!({
            "msg": "Logged In",
            "token": token,
        })),
    ))
}

/// POST /register
/// Creates a new user (password bcrypt-hashed with the configured work
/// factor) and returns the profile together with a session token
pub async fn register(
    State(app_context): State<Arc<AppContext>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_user = match (
        present(&request.username),
        present(&request.password),
        present(&request.first_name),
        present(&request.last_name),
        present(&request.phone),
    ) {
        (Some(username), Some(password), Some(first_name), Some(last_name), Some(phone)) => {
            NewUser {
                username,
                password,
                first_name,
                last_name,
                phone,
            }
        }
        _ => {
            return Err(AppError::validation("Missing required information"));
        }
    };

    let user = db::create_user(
        &app_context.db_pool,
        &new_user,
        app_context.config.bcrypt_cost,
    )
    .await?;

    let token = app_context
        .auth_manager
        .create_token(&user.username)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create session token");
            AppError::Internal(e.to_string())
        })?;

    tracing::info!(username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user,
            "token": token,
        })),
    ))
}
