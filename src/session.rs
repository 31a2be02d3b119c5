//! Report Session - the "generate report" controller
//!
//! Owns the cancellation token of the action in flight. Starting a new
//! generation cancels the previous one, so at most one completion per session
//! is ever running on behalf of the report view. The raw text of the latest
//! successful report is kept for contextual chat.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::llm::{BackendAdapter, CompletionError, CompletionRequest};
use crate::report::{self, prompt, AnalysisOptions, Document, ParsedReport};

// ============================================================================
// Request / Response
// ============================================================================

/// Inputs of one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    pub documents: Vec<Document>,
    /// Only used in comparative mode
    #[serde(default)]
    pub historical: Vec<Document>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub options: AnalysisOptions,
}

/// A finished analysis, ready for the display layer.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    #[serde(flatten)]
    pub report: ParsedReport,
    /// Insight cards plus annotated prose
    pub html: String,
    /// Unparsed model answer
    pub raw: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no documents to analyse")]
    NoDocuments,

    #[error("no model selected for the active motor")]
    NoModel,

    #[error("no report generated yet")]
    NoReport,

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl SessionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Completion(e) if e.is_cancelled())
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug)]
struct InFlight {
    id: u64,
    token: CancellationToken,
}

pub struct ReportSession {
    adapter: Arc<BackendAdapter>,
    inflight: Mutex<Option<InFlight>>,
    next_id: AtomicU64,
    current_report: RwLock<Option<String>>,
}

impl ReportSession {
    pub fn new(adapter: Arc<BackendAdapter>) -> Self {
        Self {
            adapter,
            inflight: Mutex::new(None),
            next_id: AtomicU64::new(1),
            current_report: RwLock::new(None),
        }
    }

    pub fn adapter(&self) -> &Arc<BackendAdapter> {
        &self.adapter
    }

    /// Run an analysis, cancelling whichever generation was still running.
    pub async fn generate(&self, request: ReportRequest) -> Result<GeneratedReport, SessionError> {
        if request.documents.is_empty() {
            return Err(SessionError::NoDocuments);
        }
        if self.adapter.profile().model.trim().is_empty() {
            return Err(SessionError::NoModel);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        {
            let mut inflight = self.inflight.lock().await;
            if let Some(previous) = inflight.replace(InFlight { id, token: token.clone() }) {
                previous.token.cancel();
                info!(previous = previous.id, next = id, "Superseded report generation cancelled");
            }
        }

        let options = request.options;
        let completion = CompletionRequest::new(
            prompt::analysis_prompt(
                &request.documents,
                &request.historical,
                request.notes.as_deref(),
                options.comparative,
            ),
            prompt::consultant_system_prompt(&options),
            token,
        );
        info!(
            generation = id,
            documents = request.documents.len(),
            historical = request.historical.len(),
            level = ?options.level,
            industry = ?options.industry,
            "Generating report"
        );

        let result = self.adapter.run_completion(&completion).await;

        {
            let mut inflight = self.inflight.lock().await;
            if inflight.as_ref().is_some_and(|f| f.id == id) {
                *inflight = None;
            }
        }

        let raw = result?;
        let parsed = report::parse_report(&raw);
        let html = report::render_report(&parsed);
        *self.current_report.write().await = Some(raw.clone());

        debug!(
            generation = id,
            health_score = parsed.health_score,
            findings = parsed.critical_findings.len(),
            opportunities = parsed.gold_opportunities.len(),
            "Report parsed"
        );

        Ok(GeneratedReport {
            report: parsed,
            html,
            raw,
        })
    }

    /// Fire the in-flight token. Returns whether anything was running.
    pub async fn cancel(&self) -> bool {
        match self.inflight.lock().await.take() {
            Some(inflight) => {
                inflight.token.cancel();
                info!(generation = inflight.id, "Report generation cancelled by user");
                true
            }
            None => false,
        }
    }

    /// Whether a generation is currently running.
    pub async fn is_generating(&self) -> bool {
        self.inflight.lock().await.is_some()
    }

    /// Raw text of the latest report.
    pub async fn current_report(&self) -> Option<String> {
        self.current_report.read().await.clone()
    }

    /// Use an externally produced report as chat context.
    pub async fn load_report(&self, raw: impl Into<String>) {
        *self.current_report.write().await = Some(raw.into());
    }

    /// Ask a follow-up question about the current report.
    ///
    /// Shares the in-flight token when a generation is running, so a cancel
    /// stops both.
    pub async fn ask(&self, question: &str) -> Result<String, SessionError> {
        let report = self.current_report().await.ok_or(SessionError::NoReport)?;
        let token = self
            .inflight
            .lock()
            .await
            .as_ref()
            .map_or_else(CancellationToken::new, |f| f.token.clone());

        debug!(question_chars = question.chars().count(), "Contextual chat question");
        Ok(self.adapter.query_report(question, &report, token).await?)
    }
}

// ============================================================================
// Tests
// ============================================================================
