//! API route definitions
//!
//! - /api/v1/health - liveness and active motor
//! - /api/v1/backend - motor selection, remote credentials, model choice
//! - /api/v1/ui - persisted front-end preferences (theme)
//! - /api/v1/models, /api/v1/connection - discovery on the active motor
//! - /api/v1/reports - report generation and cancellation
//! - /api/v1/chat - follow-up questions on the latest report

use axum::{routing::{get, post}, Router};

use super::handlers::{self, ApiState};

/// Create all v1 API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/backend", get(handlers::get_backend).post(handlers::select_backend))
        .route("/backend/remote", post(handlers::configure_remote))
        .route("/backend/model", post(handlers::select_model))
        .route("/ui", get(handlers::get_ui).post(handlers::update_ui))
        .route("/models", get(handlers::list_models))
        .route("/connection", get(handlers::test_connection))
        .route("/reports", post(handlers::generate_report))
        .route("/reports/cancel", post(handlers::cancel_report))
        .route("/chat", post(handlers::chat))
        .with_state(state)
}
