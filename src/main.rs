//! Report-Master - AI strategic report generator
//!
//! Sends extracted documents to a local or remote LLM motor with a strategic
//! consultant persona and turns the answer into a scored report.
//!
//! # Usage
//!
//! ```bash
//! # Serve the JSON API for the browser front-end
//! report-master serve --addr 127.0.0.1:8080
//!
//! # Check the active motor
//! report-master --motor lmstudio ping
//! report-master --motor lmstudio models
//!
//! # Analyse text exports, comparing against last year's
//! report-master analyze ventas_2024.csv --historical ventas_2023.csv \
//!     --level pro --industry sales --html informe.html --raw informe.md
//!
//! # Ask a follow-up question about a saved report
//! report-master ask --report informe.md "¿Qué región cae más?"
//! ```
//!
//! # Environment Variables
//!
//! - `REPORT_MASTER_CONFIG`: Path to the settings TOML (default: ./report_master.toml)
//! - `REPORT_MASTER_CORS_ORIGINS`: Comma-separated origins allowed by the API
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use report_master::api::{create_app, ApiState};
use report_master::config::{Settings, CONFIG_ENV_VAR, LOCAL_CONFIG_FILE};
use report_master::llm::{BackendAdapter, Motor};
use report_master::report::{AnalysisLevel, AnalysisOptions, Document, Industry};
use report_master::session::{ReportRequest, ReportSession};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "report-master")]
#[command(about = "Report-Master AI strategic report generator")]
#[command(version)]
struct CliArgs {
    /// Settings file (default: $REPORT_MASTER_CONFIG, then ./report_master.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the motor from the settings file
    #[arg(long, global = true, value_enum)]
    motor: Option<Motor>,

    /// Model to use on the active motor
    #[arg(long, global = true, env = "REPORT_MASTER_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Serve the JSON API
    Serve {
        /// Override the bind address (default: server.addr from settings)
        #[arg(short, long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },

    /// List models offered by the active motor
    Models,

    /// Test the connection to the active motor
    Ping,

    /// Generate a report from UTF-8 text files
    Analyze {
        /// Current documents
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Historical documents; enables comparative mode
        #[arg(long = "historical", value_name = "FILE")]
        historical: Vec<PathBuf>,

        /// Extra notes appended to the prompt
        #[arg(long)]
        notes: Option<String>,

        #[arg(long, value_enum, default_value_t = AnalysisLevel::Medium)]
        level: AnalysisLevel,

        #[arg(long, value_enum, default_value_t = Industry::General)]
        industry: Industry,

        /// Write the annotated HTML fragment here
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,

        /// Write the raw model answer here (usable with `ask --report`)
        #[arg(long, value_name = "FILE")]
        raw: Option<PathBuf>,
    },

    /// Ask a question about a previously generated report
    Ask {
        /// Raw report text produced by `analyze --raw`
        #[arg(long, value_name = "FILE")]
        report: PathBuf,

        question: String,
    },

    /// Print the effective settings as TOML
    Config,
}

// ============================================================================
// Setup
// ============================================================================

/// Settings plus the file `serve` saves backend changes to.
///
/// A settings file that exists but fails to load aborts startup, so a broken
/// file is never replaced by defaults.
fn load_settings(explicit: Option<&Path>) -> Result<(Settings, PathBuf)> {
    match explicit {
        Some(path) => {
            let settings = Settings::load_from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?;
            Ok((settings, path.to_path_buf()))
        }
        None => {
            let loaded = Settings::load().context("Failed to load settings")?;
            let persist_to = loaded.source.unwrap_or_else(default_settings_path);
            Ok((loaded.settings, persist_to))
        }
    }
}

/// Where new settings are created when no file was found.
fn default_settings_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR).map_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE), PathBuf::from)
}

fn apply_overrides(settings: &mut Settings, args: &CliArgs) {
    if let Some(motor) = args.motor {
        settings.motor = motor;
    }
}

fn apply_model(adapter: &BackendAdapter, model: Option<&str>) {
    if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
        adapter.select_model(model);
    }
}

/// Pick the first listed model when none is configured.
async fn ensure_model(adapter: &BackendAdapter) -> Result<()> {
    if !adapter.profile().model.is_empty() {
        return Ok(());
    }
    let models = adapter.list_models().await;
    match models.first() {
        Some(first) => {
            info!(model = %first, "No model configured, using first available");
            adapter.select_model(first);
            Ok(())
        }
        None => bail!(
            "No model configured and motor '{}' listed none (is it running?)",
            adapter.profile().motor
        ),
    }
}

fn read_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    paths
        .iter()
        .map(|p| Document::read_text_file(p).with_context(|| format!("Failed to read {}", p.display())))
        .collect()
}

/// Token fired on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received, cancelling");
        trigger.cancel();
    });
    token
}

// ============================================================================
// Commands
// ============================================================================

async fn run_serve(settings: Settings, addr: Option<String>, persist_to: PathBuf, model: Option<&str>) -> Result<()> {
    let server_addr = addr.unwrap_or_else(|| settings.server.addr.clone());
    let state = ApiState::new(settings, Some(persist_to.clone()));
    apply_model(state.session.adapter(), model);

    let profile = state.session.adapter().profile();
    info!(
        motor = %profile.motor,
        base_url = %profile.base_url,
        settings = %persist_to.display(),
        "Starting Report-Master API"
    );

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind {server_addr}"))?;
    info!("HTTP server listening on http://{}", server_addr);

    let cancel_token = shutdown_token();
    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("[HttpServer] Graceful shutdown complete");
    Ok(())
}

async fn run_models(adapter: &BackendAdapter) -> Result<()> {
    let models = adapter.list_models().await;
    if models.is_empty() {
        bail!("Motor '{}' listed no models", adapter.profile().motor);
    }
    for model in models {
        println!("{model}");
    }
    Ok(())
}

async fn run_ping(adapter: &BackendAdapter) -> Result<()> {
    let profile = adapter.profile();
    if adapter.test_connection().await {
        println!("online: {} ({})", profile.motor, profile.base_url);
        Ok(())
    } else {
        bail!("offline: {} ({})", profile.motor, profile.base_url)
    }
}

struct AnalyzeArgs {
    files: Vec<PathBuf>,
    historical: Vec<PathBuf>,
    notes: Option<String>,
    options: AnalysisOptions,
    html: Option<PathBuf>,
    raw: Option<PathBuf>,
}

async fn run_analyze(adapter: Arc<BackendAdapter>, args: AnalyzeArgs) -> Result<()> {
    ensure_model(&adapter).await?;

    let request = ReportRequest {
        documents: read_documents(&args.files)?,
        historical: read_documents(&args.historical)?,
        notes: args.notes,
        options: args.options,
    };

    let session = Arc::new(ReportSession::new(adapter));
    let cancel_token = shutdown_token();
    let canceller = Arc::clone(&session);
    tokio::spawn(async move {
        cancel_token.cancelled().await;
        canceller.cancel().await;
    });

    let generated = session.generate(request).await.context("Report generation failed")?;
    let report = &generated.report;

    println!("HEALTH SCORE: {}/100", report.health_score);
    if !report.critical_findings.is_empty() {
        println!("\nCRITICAL FINDINGS");
        for finding in &report.critical_findings {
            println!("  - {finding}");
        }
    }
    if !report.gold_opportunities.is_empty() {
        println!("\nGOLD OPPORTUNITIES");
        for opportunity in &report.gold_opportunities {
            println!("  - {opportunity}");
        }
    }
    println!("\n{}", report.cleaned_prose);

    if let Some(path) = &args.html {
        std::fs::write(path, &generated.html).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "HTML report written");
    }
    if let Some(path) = &args.raw {
        std::fs::write(path, &generated.raw).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Raw report written");
    }
    Ok(())
}

async fn run_ask(adapter: &BackendAdapter, report_path: &Path, question: &str) -> Result<()> {
    ensure_model(adapter).await?;
    let report = std::fs::read_to_string(report_path)
        .with_context(|| format!("Failed to read {}", report_path.display()))?;
    if report.trim().is_empty() {
        bail!("Report {} is empty", report_path.display());
    }

    let answer = adapter
        .query_report(question, &report, shutdown_token())
        .await
        .context("Chat request failed")?;
    println!("{answer}");
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let (mut settings, persist_to) = load_settings(args.config.as_deref())?;
    apply_overrides(&mut settings, &args);
    if !settings.motor.is_local() && settings.remote.url.trim().is_empty() {
        warn!("Remote motor selected but remote.url is not set");
    }

    let model = args.model.as_deref();
    match args.command {
        SubCommand::Serve { addr } => run_serve(settings, addr, persist_to, model).await,
        SubCommand::Config => {
            if !settings.remote.api_key.is_empty() {
                settings.remote.api_key = "<redacted>".to_string();
            }
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        command => {
            let adapter = Arc::new(settings.build_adapter());
            apply_model(&adapter, model);
            match command {
                SubCommand::Models => run_models(&adapter).await,
                SubCommand::Ping => run_ping(&adapter).await,
                SubCommand::Analyze {
                    files,
                    historical,
                    notes,
                    level,
                    industry,
                    html,
                    raw,
                } => {
                    let options = AnalysisOptions {
                        level,
                        industry,
                        comparative: !historical.is_empty(),
                    };
                    run_analyze(
                        adapter,
                        AnalyzeArgs {
                            files,
                            historical,
                            notes,
                            options,
                            html,
                            raw,
                        },
                    )
                    .await
                }
                SubCommand::Ask { report, question } => run_ask(&adapter, &report, &question).await,
                SubCommand::Serve { .. } | SubCommand::Config => Ok(()),
            }
        }
    }
}
