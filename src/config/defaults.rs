//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Motors
// ============================================================================

/// Default base URL of a local Ollama server.
pub const OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434/api";

/// Default base URL of a local LM Studio server.
pub const LMSTUDIO_BASE_URL: &str = "http://127.0.0.1:1234/v1";

/// Upper bound on a connection test (seconds).
///
/// Completions and model listing have no internal timeout; they rely on the
/// caller's cancellation token.
pub const CONNECTION_TEST_TIMEOUT_SECS: u64 = 5;

/// Sampling temperature sent with OpenAI-style chat completions.
pub const CHAT_TEMPERATURE: f64 = 0.7;

// ============================================================================
// Prompt composition
// ============================================================================

/// Characters of each document forwarded to the model.
pub const DOCUMENT_EXCERPT_CHARS: usize = 5_000;

// ============================================================================
// Report parsing
// ============================================================================

/// Health score reported when the model omits or mangles the tag.
pub const DEFAULT_HEALTH_SCORE: u8 = 85;

/// Valid health score range (inclusive).
pub const HEALTH_SCORE_MIN: u8 = 1;
pub const HEALTH_SCORE_MAX: u8 = 100;

// ============================================================================
// HTTP server
// ============================================================================

/// Bind address for `report-master serve`.
pub const SERVER_ADDR: &str = "127.0.0.1:8080";

/// Maximum accepted request body (bytes). Document uploads arrive as text.
pub const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024 * 1024;
