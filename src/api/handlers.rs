//! API route handlers
//!
//! Thin shells over [`ReportSession`] and [`BackendAdapter`]. Backend changes
//! are mirrored into the shared [`Settings`] and, when the server was started
//! with a settings file, saved back to it.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::{Settings, Theme};
use crate::llm::{BackendAdapter, BackendProfile, Motor};
use crate::session::{ReportRequest, ReportSession};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<ReportSession>,
    /// Settings mirrored from backend changes
    pub settings: Arc<RwLock<Settings>>,
    /// Where settings are saved; `None` keeps changes in memory only
    pub settings_path: Option<PathBuf>,
}

impl ApiState {
    /// State with an adapter built from `settings`.
    pub fn new(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        let adapter = Arc::new(settings.build_adapter());
        Self {
            session: Arc::new(ReportSession::new(adapter)),
            settings: Arc::new(RwLock::new(settings)),
            settings_path,
        }
    }

    fn adapter(&self) -> &BackendAdapter {
        self.session.adapter()
    }

    async fn update_settings(&self, apply: impl FnOnce(&mut Settings)) {
        let mut settings = self.settings.write().await;
        apply(&mut settings);
        if let Some(path) = &self.settings_path {
            if let Err(e) = settings.save_to_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to persist settings");
            }
        }
    }
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiErrorResponse::bad_request(rejection.body_text()))
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub motor: Motor,
    pub model: String,
    pub generating: bool,
}

/// Active profile as shown to clients. The API key itself never leaves the server.
#[derive(Debug, Serialize)]
pub struct BackendView {
    pub motor: Motor,
    pub base_url: String,
    pub model: String,
    pub local: bool,
    pub has_api_key: bool,
    pub remote_url: String,
    pub remote_model: String,
}

impl BackendView {
    fn from_adapter(adapter: &BackendAdapter) -> Self {
        let BackendProfile {
            motor,
            base_url,
            api_key,
            model,
        } = adapter.profile();
        let remote = adapter.remote();
        Self {
            motor,
            base_url,
            model,
            local: motor.is_local(),
            has_api_key: api_key.is_some() || !remote.api_key.is_empty(),
            remote_url: remote.url,
            remote_model: remote.model,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UiView {
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub motor: Motor,
    pub models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub motor: Motor,
    pub online: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectBackendRequest {
    pub motor: Motor,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureRemoteRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectModelRequest {
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/health
pub async fn get_health(State(state): State<ApiState>) -> Response {
    let profile = state.adapter().profile();
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        motor: profile.motor,
        model: profile.model,
        generating: state.session.is_generating().await,
    })
}

/// GET /api/v1/backend
pub async fn get_backend(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(BackendView::from_adapter(state.adapter()))
}

/// POST /api/v1/backend
pub async fn select_backend(
    State(state): State<ApiState>,
    payload: Result<Json<SelectBackendRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    state.adapter().select_backend(req.motor);
    state.update_settings(|s| s.motor = req.motor).await;
    ApiResponse::ok(BackendView::from_adapter(state.adapter()))
}

/// POST /api/v1/backend/remote
pub async fn configure_remote(
    State(state): State<ApiState>,
    payload: Result<Json<ConfigureRemoteRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    // empty clears the remote; anything else needs a scheme
    let url = req.url.trim();
    if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
        return ApiErrorResponse::bad_request(format!(
            "url must start with http:// or https:// (got '{url}')"
        ));
    }

    state.adapter().configure_remote(url, req.api_key.trim(), req.model.trim());
    let remote = state.adapter().remote();
    state.update_settings(|s| s.remote = remote).await;
    ApiResponse::ok(BackendView::from_adapter(state.adapter()))
}

/// POST /api/v1/backend/model
pub async fn select_model(
    State(state): State<ApiState>,
    payload: Result<Json<SelectModelRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    let model = req.model.trim();
    if model.is_empty() {
        return ApiErrorResponse::bad_request("model must not be empty");
    }

    state.adapter().select_model(model);
    if state.adapter().profile().motor == Motor::Api {
        let model = model.to_string();
        state.update_settings(|s| s.remote.model = model).await;
    }
    ApiResponse::ok(BackendView::from_adapter(state.adapter()))
}

/// GET /api/v1/ui
pub async fn get_ui(State(state): State<ApiState>) -> Response {
    let theme = state.settings.read().await.ui.theme;
    ApiResponse::ok(UiView { theme })
}

/// POST /api/v1/ui
pub async fn update_ui(
    State(state): State<ApiState>,
    payload: Result<Json<UiView>, JsonRejection>,
) -> Response {
    let req = match parse_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    state.update_settings(|s| s.ui.theme = req.theme).await;
    info!(theme = ?req.theme, "Theme updated");
    ApiResponse::ok(req)
}

/// GET /api/v1/models
pub async fn list_models(State(state): State<ApiState>) -> Response {
    let motor = state.adapter().profile().motor;
    let models = state.adapter().list_models().await;
    ApiResponse::ok(ModelsResponse { motor, models })
}

/// GET /api/v1/connection
pub async fn test_connection(State(state): State<ApiState>) -> Response {
    let motor = state.adapter().profile().motor;
    let online = state.adapter().test_connection().await;
    ApiResponse::ok(ConnectionResponse { motor, online })
}

/// POST /api/v1/reports
///
/// A newer request cancels this one; the superseded caller gets 409.
pub async fn generate_report(
    State(state): State<ApiState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    match state.session.generate(req).await {
        Ok(report) => {
            info!(health_score = report.report.health_score, "Report delivered");
            ApiResponse::ok(report)
        }
        Err(e) => e.into(),
    }
}

/// POST /api/v1/reports/cancel
pub async fn cancel_report(State(state): State<ApiState>) -> Response {
    let cancelled = state.session.cancel().await;
    ApiResponse::ok(CancelResponse { cancelled })
}

/// POST /api/v1/chat
pub async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    let question = req.question.trim();
    if question.is_empty() {
        return ApiErrorResponse::bad_request("question must not be empty");
    }

    match state.session.ask(question).await {
        Ok(answer) => ApiResponse::ok(ChatResponse { answer }),
        Err(e) => e.into(),
    }
}
