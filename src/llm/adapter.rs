//! Backend Adapter - one call surface over every motor
//!
//! Holds the active [`BackendProfile`] and nothing else between calls. Each
//! operation snapshots the profile, issues a fresh HTTP request, and maps the
//! dialect-specific answer back to plain strings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dialect::{self, CompletionBody};
use super::error::CompletionError;
use super::motor::{BackendProfile, LocalEndpoints, Motor, RemoteCredentials};
use super::CompletionRequest;
use crate::config::defaults;
use crate::report::prompt;

/// Everything the adapter remembers between calls.
#[derive(Debug, Clone)]
struct AdapterState {
    profile: BackendProfile,
    remote: RemoteCredentials,
}

/// Unified client for Ollama, LM Studio and remote OpenAI-compatible motors.
///
/// Configuration writes swap the whole state atomically; concurrent writers
/// resolve last-writer-wins. In-flight requests keep the snapshot they
/// started with.
pub struct BackendAdapter {
    http: reqwest::Client,
    endpoints: LocalEndpoints,
    state: ArcSwap<AdapterState>,
}

impl Default for BackendAdapter {
    fn default() -> Self {
        Self::new(LocalEndpoints::default())
    }
}

impl BackendAdapter {
    /// Create an adapter with Ollama selected and no remote credentials.
    pub fn new(endpoints: LocalEndpoints) -> Self {
        let remote = RemoteCredentials::default();
        let profile = BackendProfile::for_motor(Motor::default(), &endpoints, &remote);
        Self {
            http: reqwest::Client::new(),
            endpoints,
            state: ArcSwap::from_pointee(AdapterState { profile, remote }),
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Make `motor` the active backend, resetting its base URL.
    pub fn select_backend(&self, motor: Motor) {
        self.state.rcu(|current| {
            let mut next = AdapterState::clone(current);
            next.profile = BackendProfile::for_motor(motor, &self.endpoints, &next.remote);
            next
        });
        let profile = self.profile();
        info!(motor = %motor, base_url = %profile.base_url, "Motor selected");
    }

    /// Store remote API credentials; applied live when the remote motor is active.
    ///
    /// Cheap and idempotent, so settings forms may call it on every edit.
    pub fn configure_remote(&self, url: &str, api_key: &str, model: &str) {
        let remote = RemoteCredentials {
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        };
        self.state.rcu(|current| {
            let mut next = AdapterState::clone(current);
            next.remote = remote.clone();
            if next.profile.motor == Motor::Api {
                next.profile = BackendProfile::for_motor(Motor::Api, &self.endpoints, &next.remote);
            }
            next
        });
        debug!(url = %url, model = %model, "Remote API configuration updated");
    }

    /// Choose the model used by subsequent completions.
    pub fn select_model(&self, model: &str) {
        self.state.rcu(|current| {
            let mut next = AdapterState::clone(current);
            next.profile.model = model.to_string();
            next
        });
        debug!(model = %model, "Model selected");
    }

    /// Snapshot of the active profile.
    pub fn profile(&self) -> BackendProfile {
        self.state.load().profile.clone()
    }

    /// Snapshot of the stored remote credentials.
    pub fn remote(&self) -> RemoteCredentials {
        self.state.load().remote.clone()
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// List model identifiers offered by the active motor.
    ///
    /// Advisory only: any failure is logged and yields an empty list.
    pub async fn list_models(&self) -> Vec<String> {
        let profile = self.profile();
        let url = profile.models_url();

        let response = match self.discovery_request(&profile, &url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(motor = %profile.motor, url = %url, error = %e, "Model listing failed");
                return Vec::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(motor = %profile.motor, url = %url, status = %status, "Model listing rejected");
            return Vec::new();
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(motor = %profile.motor, error = %e, "Model listing body unreadable");
                return Vec::new();
            }
        };

        match dialect::extract_models(profile.motor, &body) {
            Ok(models) => {
                debug!(motor = %profile.motor, count = models.len(), "Models discovered");
                models
            }
            Err(e) => {
                warn!(motor = %profile.motor, error = %e, "Model listing had unexpected shape");
                Vec::new()
            }
        }
    }

    /// Probe the active motor's model-listing endpoint.
    ///
    /// Returns `true` only for a 2xx answer within
    /// [`defaults::CONNECTION_TEST_TIMEOUT_SECS`]. Never errors.
    pub async fn test_connection(&self) -> bool {
        let profile = self.profile();
        let url = profile.models_url();

        let result = self
            .discovery_request(&profile, &url)
            .timeout(Duration::from_secs(defaults::CONNECTION_TEST_TIMEOUT_SECS))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(motor = %profile.motor, url = %url, "Connection test passed");
                true
            }
            Ok(resp) => {
                warn!(motor = %profile.motor, url = %url, status = %resp.status(), "Connection test rejected");
                false
            }
            Err(e) => {
                warn!(motor = %profile.motor, url = %url, error = %e, "Connection test failed");
                false
            }
        }
    }

    fn discovery_request(&self, profile: &BackendProfile, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url).header(CONTENT_TYPE, "application/json");
        authorize(req, profile)
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Run one completion against the active motor.
    ///
    /// Resolves with [`CompletionError::Cancelled`] as soon as the request's
    /// token fires, dropping the in-flight HTTP exchange.
    pub async fn run_completion(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let token = request.cancellation_token();
        if token.is_cancelled() {
            info!("Completion cancelled before dispatch");
            return Err(CompletionError::Cancelled);
        }

        let profile = self.profile();
        let started = Instant::now();
        info!(
            motor = %profile.motor,
            model = %profile.model,
            prompt_chars = request.prompt().chars().count(),
            "Dispatching completion"
        );

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(CompletionError::Cancelled),
            outcome = self.send_completion(&profile, request) => outcome,
        };

        match &result {
            Ok(text) => info!(
                motor = %profile.motor,
                response_chars = text.chars().count(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Completion finished"
            ),
            Err(CompletionError::Cancelled) => info!(
                motor = %profile.motor,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Completion cancelled"
            ),
            Err(e) => warn!(motor = %profile.motor, error = %e, "Completion failed"),
        }

        result
    }

    async fn send_completion(
        &self,
        profile: &BackendProfile,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let body = CompletionBody::for_motor(
            profile.motor,
            &profile.model,
            request.prompt(),
            request.system_prompt(),
        );

        let req = self
            .http
            .post(profile.completion_url())
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        let response = authorize(req, profile)
            .send()
            .await
            .map_err(CompletionError::transport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(CompletionError::transport)?;

        if !status.is_success() {
            let message = dialect::error_message(status.as_u16(), &bytes);
            return Err(CompletionError::status(status.as_u16(), message));
        }

        dialect::extract_completion(profile.motor, &bytes)
    }

    /// Answer a follow-up question using only the supplied report as context.
    pub async fn query_report(
        &self,
        question: &str,
        report: &str,
        cancel: CancellationToken,
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest::new(
            prompt::chat_prompt(question, report),
            prompt::CHAT_SYSTEM_PROMPT,
            cancel,
        );
        self.run_completion(&request).await
    }
}

fn authorize(req: reqwest::RequestBuilder, profile: &BackendProfile) -> reqwest::RequestBuilder {
    match profile.bearer() {
        Some(bearer) => req.header(AUTHORIZATION, bearer),
        None => req,
    }
}

// ============================================================================
// Tests
// ============================================================================
