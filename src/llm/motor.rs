//! Motor variants and the active backend profile.
//!
//! A [`Motor`] is one of the three supported LLM serving dialects. The
//! [`BackendProfile`] is the snapshot the adapter works from on every call:
//! which motor, where it lives, how to authenticate, and which model to ask.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

// ============================================================================
// Motor
// ============================================================================

/// Supported LLM backend dialects.
///
/// Serialized with the identifiers persisted by the settings file
/// (`ollama`, `lmstudio`, `api`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Motor {
    /// Local Ollama-style server (`/api/tags`, `/api/generate`)
    #[default]
    Ollama,
    /// Local LM-Studio-style OpenAI-compatible server
    #[value(name = "lmstudio")]
    LmStudio,
    /// Remote OpenAI-compatible API with bearer authentication
    Api,
}

impl Motor {
    /// Stable identifier used in settings and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Motor::Ollama => "ollama",
            Motor::LmStudio => "lmstudio",
            Motor::Api => "api",
        }
    }

    /// Local motors run on the operator's machine; documents never leave it.
    pub fn is_local(self) -> bool {
        !matches!(self, Motor::Api)
    }

    /// Whether requests carry `Authorization: Bearer <key>`.
    pub fn requires_auth(self) -> bool {
        matches!(self, Motor::Api)
    }

    /// Path of the model-listing endpoint, relative to the base URL.
    pub fn models_path(self) -> &'static str {
        match self {
            Motor::Ollama => "/tags",
            Motor::LmStudio | Motor::Api => "/models",
        }
    }

    /// Path of the completion endpoint, relative to the base URL.
    pub fn completion_path(self) -> &'static str {
        match self {
            Motor::Ollama => "/generate",
            Motor::LmStudio | Motor::Api => "/chat/completions",
        }
    }
}

impl std::fmt::Display for Motor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Motor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Motor::Ollama),
            "lmstudio" => Ok(Motor::LmStudio),
            "api" => Ok(Motor::Api),
            other => Err(format!("unknown motor '{other}' (expected ollama, lmstudio or api)")),
        }
    }
}

// ============================================================================
// Local endpoints
// ============================================================================

/// Base URLs used when a local motor is selected.
///
/// Defaults match the stock ports of Ollama and LM Studio. Overridable from
/// the settings file for servers bound elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEndpoints {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_lmstudio_url")]
    pub lmstudio_url: String,
}

fn default_ollama_url() -> String {
    defaults::OLLAMA_BASE_URL.to_string()
}

fn default_lmstudio_url() -> String {
    defaults::LMSTUDIO_BASE_URL.to_string()
}

impl Default for LocalEndpoints {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            lmstudio_url: default_lmstudio_url(),
        }
    }
}

// ============================================================================
// Remote credentials
// ============================================================================

/// User-supplied configuration for the remote API motor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCredentials {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
}

// ============================================================================
// Backend profile
// ============================================================================

/// The active motor together with everything needed to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    pub motor: Motor,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl BackendProfile {
    /// Profile for a freshly selected motor.
    ///
    /// Local motors get their default base URL and no model; the remote motor
    /// takes URL, key and model from the stored credentials.
    pub fn for_motor(motor: Motor, endpoints: &LocalEndpoints, remote: &RemoteCredentials) -> Self {
        match motor {
            Motor::Ollama => Self::local(motor, &endpoints.ollama_url),
            Motor::LmStudio => Self::local(motor, &endpoints.lmstudio_url),
            Motor::Api => Self {
                motor,
                base_url: normalize_base_url(&remote.url),
                api_key: Some(remote.api_key.clone()).filter(|k| !k.is_empty()),
                model: remote.model.clone(),
            },
        }
    }

    fn local(motor: Motor, base_url: &str) -> Self {
        Self {
            motor,
            base_url: normalize_base_url(base_url),
            api_key: None,
            model: String::new(),
        }
    }

    /// Full URL of the model-listing endpoint.
    pub fn models_url(&self) -> String {
        format!("{}{}", self.base_url, self.motor.models_path())
    }

    /// Full URL of the completion endpoint.
    pub fn completion_url(&self) -> String {
        format!("{}{}", self.base_url, self.motor.completion_path())
    }

    /// Bearer header value, only for motors that authenticate.
    pub fn bearer(&self) -> Option<String> {
        if !self.motor.requires_auth() {
            return None;
        }
        Some(format!("Bearer {}", self.api_key.as_deref().unwrap_or_default()))
    }
}

/// Strip whitespace and trailing slashes so paths join cleanly.
pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

// ============================================================================
// Tests
// ============================================================================
