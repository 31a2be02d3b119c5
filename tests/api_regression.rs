//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the /api/v1/* endpoints using `tower::ServiceExt::oneshot()`. The LLM
//! motor behind the app is the shared in-process mock.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{MockLlm, Reply};
use report_master::api::{create_app, ApiState};
use report_master::config::{Settings, Theme};
use report_master::llm::Motor;

fn settings_for(mock: &MockLlm) -> Settings {
    Settings {
        endpoints: mock.endpoints(),
        ..Settings::default()
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// All GET endpoints return 200 with the envelope.
#[tokio::test]
async fn test_get_endpoints_return_envelope() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    for endpoint in ["/api/v1/health", "/api/v1/backend", "/api/v1/models", "/api/v1/connection"] {
        let (status, body) = get(&app, endpoint).await;
        assert_eq!(status, StatusCode::OK, "GET {endpoint}");
        assert!(body.get("data").is_some(), "GET {endpoint} missing data");
        assert!(body["meta"]["timestamp"].is_string(), "GET {endpoint} missing meta");
    }
}

#[tokio::test]
async fn test_models_and_connection() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (_, body) = get(&app, "/api/v1/models").await;
    assert_eq!(body["data"]["motor"], "ollama");
    assert_eq!(body["data"]["models"], json!(["llama3:8b", "mistral"]));

    let (_, body) = get(&app, "/api/v1/connection").await;
    assert_eq!(body["data"]["online"], true);
}

#[tokio::test]
async fn test_select_backend_switches_and_clears_model() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (status, _) = post(&app, "/api/v1/backend/model", json!({"model": "llama3:8b"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/api/v1/backend", json!({"motor": "lmstudio"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["motor"], "lmstudio");
    assert_eq!(body["data"]["base_url"], format!("{}/v1", mock.base_url));
    assert_eq!(body["data"]["model"], "");
    assert_eq!(body["data"]["local"], true);
}

#[tokio::test]
async fn test_unknown_motor_is_bad_request() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (status, body) = post(&app, "/api/v1/backend", json!({"motor": "gemini"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_configure_remote_never_echoes_key() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (status, body) = post(
        &app,
        "/api/v1/backend/remote",
        json!({"url": "ftp://nope", "api_key": "sk", "model": "m"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = post(
        &app,
        "/api/v1/backend/remote",
        json!({"url": mock.remote_url(), "api_key": "sk-secret", "model": "gpt-4o"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(&app, "/api/v1/backend", json!({"motor": "api"})).await;
    assert_eq!(body["data"]["motor"], "api");
    assert_eq!(body["data"]["model"], "gpt-4o");
    assert_eq!(body["data"]["has_api_key"], true);
    assert!(!body.to_string().contains("sk-secret"));
}

#[tokio::test]
async fn test_backend_changes_are_persisted() {
    let mock = MockLlm::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report_master.toml");
    let app = create_app(ApiState::new(settings_for(&mock), Some(path.clone())));

    post(
        &app,
        "/api/v1/backend/remote",
        json!({"url": mock.remote_url(), "api_key": "sk-1", "model": "gpt-4o"}),
    )
    .await;
    post(&app, "/api/v1/backend", json!({"motor": "api"})).await;

    let saved = Settings::load_from_file(&path).unwrap();
    assert_eq!(saved.motor, Motor::Api);
    assert_eq!(saved.remote.url, mock.remote_url());
    assert_eq!(saved.remote.api_key, "sk-1");
    assert_eq!(saved.remote.model, "gpt-4o");
}

#[tokio::test]
async fn test_generate_report_roundtrip() {
    let mock = MockLlm::start().await;
    mock.reply(
        "/api/generate",
        Reply::ok(json!({"response": "[HEALTH_SCORE: 91]\n[GOLD_OPPORTUNITIES]\n- Subir precios\n"})),
    );
    let app = create_app(ApiState::new(settings_for(&mock), None));
    post(&app, "/api/v1/backend/model", json!({"model": "llama3:8b"})).await;

    let (status, body) = post(
        &app,
        "/api/v1/reports",
        json!({"documents": [{"name": "q3.csv", "content": "total,100"}], "options": {"level": "pro"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["health_score"], 91);
    assert_eq!(body["data"]["gold_opportunities"], json!(["Subir precios"]));
    assert_eq!(body["data"]["critical_findings"], json!([]));
    assert!(body["data"]["html"].as_str().unwrap().contains("badge-opportunity"));

    mock.reply("/api/generate", Reply::ok(json!({"response": "Sí, subir precios."})));
    let (status, body) = post(&app, "/api/v1/chat", json!({"question": "¿Subo precios?"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["answer"], "Sí, subir precios.");
}

#[tokio::test]
async fn test_generate_report_validation_errors() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (status, body) = post(&app, "/api/v1/reports", json!({"documents": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = post(
        &app,
        "/api/v1/reports",
        json!({"documents": [{"name": "a.txt", "content": "x"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no model selected");

    let (status, _) = post(&app, "/api/v1/chat", json!({"question": "¿Algo?"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no report yet");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let mock = MockLlm::start().await;
    mock.reply(
        "/api/generate",
        Reply::status(StatusCode::NOT_FOUND, json!({"error": "model 'llama3:8b' not found"})),
    );
    let app = create_app(ApiState::new(settings_for(&mock), None));
    post(&app, "/api/v1/backend/model", json!({"model": "llama3:8b"})).await;

    let (status, body) = post(
        &app,
        "/api/v1/reports",
        json!({"documents": [{"name": "a.txt", "content": "x"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "REMOTE_ERROR");
    assert_eq!(body["error"]["message"], "model 'llama3:8b' not found");
}

#[tokio::test]
async fn test_cancel_without_generation() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    let (status, body) = post(&app, "/api/v1/reports/cancel", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancelled"], false);
}

#[tokio::test]
async fn test_configure_remote_accepts_empty_url_to_clear() {
    let mock = MockLlm::start().await;
    let app = create_app(ApiState::new(settings_for(&mock), None));

    post(
        &app,
        "/api/v1/backend/remote",
        json!({"url": mock.remote_url(), "api_key": "sk-old", "model": "gpt-4o"}),
    )
    .await;

    let (status, body) = post(&app, "/api/v1/backend/remote", json!({"url": "", "api_key": "", "model": ""})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remote_url"], "");
    assert_eq!(body["data"]["remote_model"], "");
    assert_eq!(body["data"]["has_api_key"], false);

    // partial input while typing is stored as-is
    let (status, body) = post(&app, "/api/v1/backend/remote", json!({"url": "https://", "model": "g"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remote_url"], "https://");
}

#[tokio::test]
async fn test_ui_theme_read_and_persisted() {
    let mock = MockLlm::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report_master.toml");
    let app = create_app(ApiState::new(settings_for(&mock), Some(path.clone())));

    let (status, body) = get(&app, "/api/v1/ui").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["theme"], "dark");

    let (status, body) = post(&app, "/api/v1/ui", json!({"theme": "light"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["theme"], "light");

    let (_, body) = get(&app, "/api/v1/ui").await;
    assert_eq!(body["data"]["theme"], "light");
    assert_eq!(Settings::load_from_file(&path).unwrap().ui.theme, Theme::Light);

    let (status, body) = post(&app, "/api/v1/ui", json!({"theme": "sepia"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

/// Settings loaded from a file are saved back to it without losing stored credentials.
#[tokio::test]
async fn test_backend_change_keeps_stored_credentials() {
    let mock = MockLlm::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report_master.toml");
    let mut seeded = settings_for(&mock);
    seeded.remote.url = mock.remote_url();
    seeded.remote.api_key = "sk-precious".to_string();
    seeded.remote.model = "gpt-4o".to_string();
    seeded.save_to_file(&path).unwrap();

    let loaded = Settings::search(Some(&path), &dir.path().join("missing.toml")).unwrap();
    assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    let app = create_app(ApiState::new(loaded.settings, loaded.source));

    let (status, _) = post(&app, "/api/v1/backend", json!({"motor": "lmstudio"})).await;
    assert_eq!(status, StatusCode::OK);

    let saved = Settings::load_from_file(&path).unwrap();
    assert_eq!(saved.motor, Motor::LmStudio);
    assert_eq!(saved.remote.api_key, "sk-precious");
    assert_eq!(saved.remote.url, mock.remote_url());
}

#[tokio::test]
async fn test_broken_settings_file_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report_master.toml");
    let contents = "[remote]\napi_key = \"sk-precious\"\n\n[server]\naddr = \"localhost:8080\"\n";
    std::fs::write(&path, contents).unwrap();

    assert!(Settings::search(Some(&path), &dir.path().join("missing.toml")).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
}

#[tokio::test]
async fn test_superseded_report_is_conflict() {
    let mock = MockLlm::start().await;
    mock.reply(
        "/api/generate",
        Reply::ok(json!({"response": "[HEALTH_SCORE: 77] listo"})).delayed(Duration::from_millis(500)),
    );
    let app = create_app(ApiState::new(settings_for(&mock), None));
    post(&app, "/api/v1/backend/model", json!({"model": "llama3:8b"})).await;

    let request = json!({"documents": [{"name": "a.txt", "content": "x"}]});
    let first = {
        let app = app.clone();
        let request = request.clone();
        tokio::spawn(async move { post(&app, "/api/v1/reports", request).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, body) = post(&app, "/api/v1/reports", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["health_score"], 77);

    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CANCELLED");
}
