//! In-process mock LLM motor shared by the integration tests.
//!
//! Binds an axum server on `127.0.0.1:0`, records every request it sees and
//! answers each path with a canned JSON reply.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};

use report_master::llm::{BackendAdapter, LocalEndpoints};

/// One request received by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct MockState {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

/// Mock motor speaking both dialects.
///
/// Ollama lives under `/api`, LM Studio under `/v1`, the remote API under
/// `/remote`.
pub struct MockLlm {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockLlm {
    /// Start a mock with sensible replies on every known path.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new().fallback({
            let state = Arc::clone(&state);
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let state = Arc::clone(&state);
                async move { handle(&state, method, &uri, &headers, &body).await }
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let mock = Self {
            base_url: format!("http://{addr}"),
            state,
        };
        mock.reply("/api/tags", Reply::ok(json!({"models": [{"name": "llama3:8b"}, {"name": "mistral"}]})));
        mock.reply("/v1/models", Reply::ok(json!({"data": [{"id": "qwen2.5-7b"}]})));
        mock.reply("/remote/models", Reply::ok(json!({"data": [{"id": "gpt-4o-mini"}, {"id": "gpt-4o"}]})));
        mock.reply("/api/generate", Reply::ok(json!({"response": "ollama answer"})));
        mock.reply("/v1/chat/completions", chat_reply("lmstudio answer"));
        mock.reply("/remote/chat/completions", chat_reply("remote answer"));
        mock
    }

    /// Replace the reply for `path`.
    pub fn reply(&self, path: &str, reply: Reply) {
        self.state.replies.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("mock received no request")
    }

    pub fn endpoints(&self) -> LocalEndpoints {
        LocalEndpoints {
            ollama_url: format!("{}/api", self.base_url),
            lmstudio_url: format!("{}/v1", self.base_url),
        }
    }

    pub fn remote_url(&self) -> String {
        format!("{}/remote", self.base_url)
    }

    pub fn adapter(&self) -> BackendAdapter {
        BackendAdapter::new(self.endpoints())
    }
}

/// OpenAI-style completion reply carrying `content`.
pub fn chat_reply(content: &str) -> Reply {
    Reply::ok(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

async fn handle(state: &MockState, method: Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    });

    let reply = state.replies.lock().unwrap().get(&path).cloned();
    match reply {
        Some(reply) => {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            (reply.status, axum::Json(reply.body)).into_response()
        }
        None => (StatusCode::NOT_FOUND, axum::Json(json!({"error": "no such path"}))).into_response(),
    }
}

/// A port that accepts TCP connections but never answers them.
pub async fn silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// A port nothing listens on.
pub async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
