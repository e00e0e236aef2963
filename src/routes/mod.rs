// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: router assembly and middleware layering
// - auth.rs: registration and login
// - messages.rs: message create/fetch/mark-read
// - users.rs: user listing and per-user message history
// - health.rs: health check
// - extractors.rs: AuthenticatedUser (Bearer token validation)
// - middleware.rs: request logging
//
// ============================================================================

mod auth;
mod extractors;
mod health;
mod messages;
mod middleware;
mod users;

pub use extractors::AuthenticatedUser;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/health", get(health::health_check))
        // Authentication
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        // Messages (auth via AuthenticatedUser extractor)
        .route("/messages", post(messages::create_message))
        .route("/messages/:id", get(messages::get_message))
        .route("/messages/:id/read", post(messages::mark_read))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/:username", get(users::get_user))
        .route("/users/:username/from", get(users::messages_from))
        .route("/users/:username/to", get(users::messages_to))
        // Middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .into_inner(),
        )
        .with_state(app_context)
}
