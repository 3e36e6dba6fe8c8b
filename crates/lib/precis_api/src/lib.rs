//! # precis_api
//!
//! HTTP API library for Precis.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use precis_core::auth::otp::Mailer;
use precis_core::config::AppConfig;
use precis_core::dispatch::Dispatcher;

use crate::handlers::{auth, health, notify, summaries, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// Application configuration.
    pub config: AppConfig,
    /// Handle to the summarisation work queue.
    pub dispatcher: Dispatcher,
    /// OTP delivery collaborator.
    pub mailer: Arc<dyn Mailer>,
}

/// Run embedded database migrations.
///
/// Delegates to `precis_core::migrate::migrate()` which owns the migration
/// files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    precis_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required). /notify/task authenticates with the
    // shared notification key inside the handler.
    let public = Router::new()
        .route("/", get(health::sanity_check))
        .route("/user/register/password", post(auth::register_handler))
        .route("/user/register/resend_otp", post(auth::resend_otp_handler))
        .route("/user/register/verify", post(auth::verify_handler))
        .route("/user/login/password", post(auth::login_handler))
        .route(
            "/user/auth/forgot_password",
            post(auth::forgot_password_handler),
        )
        .route(
            "/user/auth/reset_password",
            post(auth::reset_password_handler),
        )
        .route("/notify/task", post(notify::notify_task_handler));

    // Protected routes (require a valid, non-revoked token)
    let protected = Router::new()
        .route("/user/auth/refresh_token", post(auth::refresh_handler))
        .route(
            "/generate_summary",
            post(summaries::generate_summary_handler),
        )
        .route("/user/get_summary", get(summaries::get_summary_handler))
        .route("/user/pending_tasks", get(summaries::pending_tasks_handler))
        .route(
            "/user/completed_tasks",
            get(summaries::completed_tasks_handler),
        )
        .route("/user/tasks", get(summaries::all_tasks_handler))
        .route("/user/update_key", post(users::update_key_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
