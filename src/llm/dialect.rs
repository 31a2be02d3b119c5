//! Wire shapes of the two HTTP dialects spoken by the motors.
//!
//! Ollama uses its native `/generate` + `/tags` API. LM Studio and remote
//! providers speak the OpenAI chat-completions dialect. Nothing in this
//! module leaks past the adapter: callers only ever see `String`s.

use serde::{Deserialize, Serialize};

use super::error::CompletionError;
use super::motor::Motor;
use crate::config::defaults;

// ============================================================================
// Request bodies
// ============================================================================

/// Ollama `/generate` request (non-streaming).
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: &'a str,
    pub stream: bool,
}

/// One message of an OpenAI-style chat exchange.
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// OpenAI-style `/chat/completions` request.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
    pub temperature: f64,
}

/// Completion body for whichever dialect the motor speaks.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CompletionBody<'a> {
    Generate(GenerateRequest<'a>),
    Chat(ChatRequest<'a>),
}

impl<'a> CompletionBody<'a> {
    /// Shape a completion body for `motor`.
    pub fn for_motor(motor: Motor, model: &'a str, prompt: &'a str, system_prompt: &'a str) -> Self {
        match motor {
            Motor::Ollama => CompletionBody::Generate(GenerateRequest {
                model,
                prompt,
                system: system_prompt,
                stream: false,
            }),
            Motor::LmStudio | Motor::Api => CompletionBody::Chat(ChatRequest {
                model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: system_prompt,
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: defaults::CHAT_TEMPERATURE,
            }),
        }
    }
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
}

/// Pull the generated text out of a successful completion response.
pub fn extract_completion(motor: Motor, body: &[u8]) -> Result<String, CompletionError> {
    match motor {
        Motor::Ollama => {
            let parsed: GenerateResponse =
                serde_json::from_slice(body).map_err(CompletionError::transport)?;
            Ok(parsed.response)
        }
        Motor::LmStudio | Motor::Api => {
            let parsed: ChatResponse =
                serde_json::from_slice(body).map_err(CompletionError::transport)?;
            parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| CompletionError::transport("response contained no choices"))
        }
    }
}

/// Flatten a model-listing response into model identifiers.
pub fn extract_models(motor: Motor, body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    match motor {
        Motor::Ollama => {
            let tags: OllamaTags = serde_json::from_slice(body)?;
            Ok(tags.models.into_iter().map(|m| m.name).collect())
        }
        Motor::LmStudio | Motor::Api => {
            let list: OpenAiModelList = serde_json::from_slice(body)?;
            Ok(list.data.into_iter().map(|m| m.id).collect())
        }
    }
}

/// Best human-readable message from a non-2xx response body.
///
/// Tries `error.message`, then `error` as a plain string, then falls back to
/// `Error <status>`.
pub fn error_message(status: u16, body: &[u8]) -> String {
    let fallback = || format!("Error {status}");
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return fallback();
    };
    let error = &value["error"];
    error["message"]
        .as_str()
        .or_else(|| error.as_str())
        .filter(|msg| !msg.trim().is_empty())
        .map_or_else(fallback, str::to_string)
}

// ============================================================================
// Tests
// ============================================================================
