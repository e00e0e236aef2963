use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::context::AppContext;

/// GET /health
/// Health check endpoint: verifies the database answers a trivial query
pub async fn health_check(State(app_context): State<Arc<AppContext>>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&app_context.db_pool).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
        }
    }
}
