//! LLM Motor Module
//!
//! Unifies the supported LLM serving dialects behind one adapter.
//!
//! ## Motors
//!
//! | motor | default base URL | auth |
//! |---|---|---|
//! | `ollama` | `http://127.0.0.1:11434/api` | none |
//! | `lmstudio` | `http://127.0.0.1:1234/v1` | none |
//! | `api` | user-supplied | `Authorization: Bearer <key>` |
//!
//! ## Failure policy
//!
//! - Completions fail with a typed [`CompletionError`], cancellation kept
//!   distinct from every remote failure.
//! - Model listing and connection tests never fail: they degrade to an empty
//!   list / `false` and log the detail.

use tokio_util::sync::CancellationToken;

mod adapter;
mod dialect;
mod error;
mod motor;

pub use adapter::BackendAdapter;
pub use error::CompletionError;
pub use motor::{BackendProfile, LocalEndpoints, Motor, RemoteCredentials};

/// One prompt + system instruction pair, tied to a caller-owned cancellation token.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    prompt: String,
    system_prompt: String,
    cancel: CancellationToken,
}

impl CompletionRequest {
    pub fn new(
        prompt: impl Into<String>,
        system_prompt: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: system_prompt.into(),
            cancel,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
