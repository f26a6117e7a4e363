//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the newsdesk analyst.

use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::news_file::JsonFileNewsSource;
use crate::adapters::ollama::{OllamaClient, OllamaConfig};
use crate::application::{AnalysisOrchestrator, BackendStatus, ModelStatus, ProvisionPolicy};
use crate::config::{load_or_default, Config};
use crate::domain::{ModelSpec, NewsSnapshot, Sentiment};
use crate::ports::{LlmBackendPort, NewsSourcePort};

/// Newsdesk - Daily financial news analysis with a local LLM
#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Daily financial news analysis with a local LLM",
    long_about = "Newsdesk feeds a day's categorized financial news into a locally hosted \
                  Ollama model and prints a narrative market analysis."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a day's news snapshot
    Analyze(AnalyzeCmd),

    /// Check backend liveness and list resident models
    Status(StatusCmd),

    /// Make sure a model is resident, pulling it if needed
    Pull(PullCmd),

    /// Show a day's news snapshot with its sentiment breakdown
    News(NewsCmd),
}

/// Analyze a snapshot
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// Snapshot date (YYYY-MM-DD); latest available when omitted
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<String>,

    /// Specific focus for the analysis
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Override the configured model
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the configured backend URL
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Read the snapshot from this JSON file instead of the snapshot directory
    #[arg(long, value_name = "FILE", conflicts_with = "date")]
    pub snapshot: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Check backend status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Override the configured backend URL
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,
}

/// Provision a model
#[derive(Parser, Debug)]
pub struct PullCmd {
    /// Model name (e.g., deepseek-r1:7b); configured model when omitted
    #[arg(value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the configured backend URL
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,
}

/// Show a snapshot
#[derive(Parser, Debug)]
pub struct NewsCmd {
    /// Snapshot date (YYYY-MM-DD); latest available when omitted
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<String>,

    /// Print the snapshot and counts as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_or_default(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Analyze(cmd) => analyze_command(cmd, &config).await,
        Command::Status(cmd) => status_command(cmd, &config).await,
        Command::Pull(cmd) => pull_command(cmd, &config).await,
        Command::News(cmd) => news_command(cmd, &config).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Resolve the model spec from config plus command-line overrides
fn resolve_model(config: &Config, model: Option<String>, host: Option<String>) -> Result<ModelSpec> {
    let base = config.backend.model_spec();
    let spec = ModelSpec::new(
        model.unwrap_or(base.name),
        host.unwrap_or(base.host),
    );
    if spec.name.trim().is_empty() {
        bail!("Model name cannot be blank");
    }
    Ok(spec)
}

fn build_backend(config: &Config) -> Result<Arc<dyn LlmBackendPort>> {
    let client = OllamaClient::with_config(OllamaConfig::from(&config.backend))
        .context("Failed to create Ollama client")?;
    Ok(Arc::new(client))
}

/// Handle analyze command
async fn analyze_command(cmd: AnalyzeCmd, config: &Config) -> Result<()> {
    let spec = resolve_model(config, cmd.model, cmd.host)?;

    let orchestrator = AnalysisOrchestrator::new(build_backend(config)?, spec.clone())
        .with_provision_policy(ProvisionPolicy::from(&config.provisioning));
    let query = cmd.query.as_deref();

    let (label, outcome) = match &cmd.snapshot {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            let snapshot: NewsSnapshot = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
            let outcome = orchestrator.analyze_with(&snapshot, query, &spec).await;
            (snapshot.date, outcome)
        }
        None => {
            let source = JsonFileNewsSource::new(config.news.snapshot_path());
            tracing::debug!(dir = %source.dir().display(), "Reading news snapshots");
            let outcome = orchestrator
                .analyze_from_source(&source, cmd.date.as_deref(), query, &spec)
                .await;
            (cmd.date.unwrap_or_else(|| "latest".to_string()), outcome)
        }
    };

    match outcome {
        Ok(result) => {
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Financial News Analysis - {} ({})", result.date, result.model);
                println!();
                println!("{}", result.text);
            }
            Ok(())
        }
        Err(e) => {
            if e.is_retryable() {
                tracing::warn!(kind = ?e.kind(), "Analysis failed; safe to retry once the backend recovers");
            }
            Err(e).context(format!("Analysis of {} news failed", label))
        }
    }
}

/// Handle status command
async fn status_command(cmd: StatusCmd, config: &Config) -> Result<()> {
    let spec = resolve_model(config, None, cmd.host)?;
    let backend = build_backend(config)?;

    tracing::info!(host = %spec.host, "Checking backend status");

    if let Err(e) = backend.ping(&spec.host).await {
        bail!(
            "Backend at {} is not reachable: {}\n\nStart it with: ollama serve",
            spec.host,
            e
        );
    }

    let models = backend
        .list_models(&spec.host)
        .await
        .context("Failed to list models")?;

    println!("Backend: {} (up)", spec.host);
    println!("Configured model: {}", spec.name);
    if models.is_empty() {
        println!("Resident models: none");
    } else {
        println!("Resident models:");
        for model in &models {
            let marker = if model.matches(&spec.name) { "*" } else { " " };
            match model.size {
                Some(size) => println!(" {} {} ({:.1} GB)", marker, model.name, size as f64 / 1e9),
                None => println!(" {} {}", marker, model.name),
            }
        }
    }

    Ok(())
}

/// Handle pull command
async fn pull_command(cmd: PullCmd, config: &Config) -> Result<()> {
    let spec = resolve_model(config, cmd.model, cmd.host)?;
    let orchestrator = AnalysisOrchestrator::new(build_backend(config)?, spec.clone())
        .with_provision_policy(ProvisionPolicy::from(&config.provisioning));
    let guard = orchestrator.guard();

    if let BackendStatus::Unreachable { reason } = guard.check_backend(&spec.host).await {
        bail!("Backend at {} is not reachable: {}", spec.host, reason);
    }

    match guard.ensure_model(&spec.host, &spec.name).await {
        ModelStatus::Ready => {
            println!("Model {} is ready on {}", spec.name, spec.host);
            Ok(())
        }
        ModelStatus::ProvisionFailed { model, reason } => {
            bail!("Failed to provision {}: {}\n\nTry: ollama pull {}", model, reason, model)
        }
        ModelStatus::Unreachable { reason } => {
            bail!("Backend at {} stopped responding: {}", spec.host, reason)
        }
    }
}

/// Handle news command
async fn news_command(cmd: NewsCmd, config: &Config) -> Result<()> {
    let source = JsonFileNewsSource::new(config.news.snapshot_path());
    let fetched = match cmd.date.as_deref() {
        Some(date) => source.by_date(date).await,
        None => source.latest().await,
    };
    let snapshot = fetched.with_context(|| {
        format!(
            "No news snapshot for {} in {}",
            cmd.date.as_deref().unwrap_or("latest"),
            source.dir().display()
        )
    })?;

    if cmd.json {
        let payload = serde_json::json!({
            "snapshot": snapshot,
            "total_articles": snapshot.total_articles(),
            "sentiment": snapshot.sentiment_counts(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", render_overview(&snapshot));
    }

    Ok(())
}

/// Human-readable snapshot overview: totals, headlines per category, sentiment
fn render_overview(snapshot: &NewsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Financial News - {}", snapshot.date);
    let _ = writeln!(
        out,
        "Articles: {} | Categories: {}",
        snapshot.total_articles(),
        snapshot.categories.len()
    );

    for (category, articles) in snapshot.iter_categories() {
        let _ = writeln!(out, "\n{} ({})", category.to_uppercase(), articles.len());
        for article in articles {
            let _ = writeln!(out, "  - {} [{}, {}]", article.headline, article.time, article.sentiment);
            let origin = match (article.source.as_deref(), article.url.as_deref()) {
                (Some(source), Some(url)) => Some(format!("{} <{}>", source, url)),
                (Some(source), None) => Some(source.to_string()),
                (None, Some(url)) => Some(format!("<{}>", url)),
                (None, None) => None,
            };
            if let Some(origin) = origin {
                let _ = writeln!(out, "    {}", origin);
            }
        }
    }

    let counts = snapshot.sentiment_counts();
    let _ = writeln!(out, "\nSentiment:");
    for (label, sentiment, count) in [
        ("positive", Sentiment::Positive, counts.positive),
        ("neutral", Sentiment::Neutral, counts.neutral),
        ("negative", Sentiment::Negative, counts.negative),
    ] {
        let _ = writeln!(out, "  {:<9}{:>4} ({:.1}%)", label, count, counts.share(sentiment) * 100.0);
    }

    out
}
