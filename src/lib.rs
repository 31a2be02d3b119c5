//! Report-Master: strategic reports from local or remote LLM motors
//!
//! Documents go in, a consultant-style report comes out.
//!
//! ## Architecture
//!
//! - **LLM Module**: one adapter over Ollama, LM Studio and remote
//!   OpenAI-compatible APIs (model discovery, connection test, cancellable
//!   completions)
//! - **Report Module**: prompt composition, tagged-section parsing and HTML
//!   annotation of the model answer
//! - **Session**: the "generate report" controller with single in-flight
//!   cancellation and contextual chat
//! - **Config**: TOML settings with env-var override
//! - **API**: axum JSON endpoints for the browser front-end

pub mod api;
pub mod config;
pub mod llm;
pub mod report;
pub mod session;

pub use config::Settings;
pub use llm::{BackendAdapter, BackendProfile, CompletionError, CompletionRequest, Motor};
pub use report::{parse_report, render_report, Document, DocumentKind, ParsedReport};
pub use session::{GeneratedReport, ReportRequest, ReportSession, SessionError};
