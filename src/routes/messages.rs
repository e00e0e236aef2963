// ============================================================================
// Messages Routes
// ============================================================================
//
// Endpoints:
// - POST /messages - Send a message
// - GET /messages/:id - Fetch a message (parties only)
// - POST /messages/:id/read - Mark a message read (recipient only)
//
// A message is visible to exactly its sender and recipient; everyone else
// gets the same 404 a missing id would produce, so existence never leaks.
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;
use crate::db;
use crate::error::AppError;
use crate::routes::extractors::AuthenticatedUser;

const MESSAGE_NOT_FOUND: &str = "No such message";

/// Request body for sending a message. The sender is always the
/// authenticated user; an explicit `from_username` is accepted only when
/// it matches the session.
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub from_username: Option<String>,
    pub to_username: Option<String>,
    pub body: Option<String>,
}

/// POST /messages
/// Sends a message from the authenticated user
pub async fn create_message(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Json(request): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let sender = user.0;

    // Sender identity comes from the session token, never the body
    if let Some(claimed) = request.from_username.as_deref() {
        if claimed != sender {
            tracing::warn!(
                username = %sender,
                claimed = %claimed,
                "Rejected attempt to send as another user"
            );
            return Err(AppError::auth("Cannot send messages as another user"));
        }
    }

    let to_username = request
        .to_username
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation("to_username required"))?;
    let body = request
        .body
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::validation("body required"))?;

    let message = db::create_message(&app_context.db_pool, &sender, to_username, body).await?;

    tracing::info!(
        from = %message.from_username,
        to = %message.to_username,
        message_id = message.id,
        "Message sent"
    );

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

/// GET /messages/:id
/// Fetches a message with both party profiles embedded; the requester
/// must be the sender or the recipient
pub async fn get_message(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let message = db::get_message(&app_context.db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(MESSAGE_NOT_FOUND))?;

    if !message.is_party(&user.0) {
        tracing::warn!(
            username = %user.0,
            message_id = id,
            "Non-party attempted to read a message"
        );
        return Err(AppError::not_found(MESSAGE_NOT_FOUND));
    }

    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}

/// POST /messages/:id/read
/// Marks a message read. Only the recipient may do this; re-marking is
/// an idempotent no-op that reports the original timestamp.
pub async fn mark_read(
    State(app_context): State<Arc<AppContext>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let message = db::get_message(&app_context.db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(MESSAGE_NOT_FOUND))?;

    if !message.is_party(&user.0) {
        return Err(AppError::not_found(MESSAGE_NOT_FOUND));
    }
    if !message.is_recipient(&user.0) {
        return Err(AppError::auth("Only the recipient may mark a message read"));
    }

    let receipt = db::mark_read(&app_context.db_pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(MESSAGE_NOT_FOUND))?;

    tracing::info!(
        username = %user.0,
        message_id = id,
        "Message marked read"
    );

    Ok((StatusCode::OK, Json(json!({ "message": receipt }))))
}
