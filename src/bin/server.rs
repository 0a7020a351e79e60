//! Career Advisor HTTP server
//!
//! Run with: career-server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use career_advisor::agent::ChatOrchestrator;
use career_advisor::api::{ApiServer, AppState};
use career_advisor::completion::OpenAiCompatibleClient;
use career_advisor::storage::{FeedbackLedger, MetricsLedger};
use career_advisor::types::{CompletionConfig, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "career-server")]
#[command(about = "Career advisor HTTP API")]
#[command(version)]
struct Args {
    /// Directory holding feedback.json and metrics.json
    #[arg(long, env = "CAREER_DATA_DIR", default_value = "data")]
    data_dir: String,

    /// Address to listen on
    #[arg(long, env = "CAREER_BIND", default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Bearer token for /api/admin routes (admin routes disabled if unset)
    #[arg(long, env = "CAREER_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// Log format (text or json)
    #[arg(long, env = "CAREER_LOG_FORMAT", default_value = "text")]
    log_format: String,
}

fn init_tracing(format: &str) {
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_format);

    // Expand ~ in path
    let store = StoreConfig {
        data_dir: shellexpand::tilde(&args.data_dir).to_string(),
    };

    let completion = CompletionConfig::from_env().context("cannot start without an API key")?;
    tracing::info!(
        "Using model {} at {}",
        completion.model,
        completion.base_url
    );
    let backend = Arc::new(OpenAiCompatibleClient::new(completion)?);

    let metrics = Arc::new(MetricsLedger::open(store.metrics_path()));
    let feedback =
        Arc::new(FeedbackLedger::open(store.feedback_path()).with_metrics(metrics.clone()));
    let orchestrator = Arc::new(ChatOrchestrator::new(backend, metrics.clone()));

    if args.admin_token.is_none() {
        tracing::warn!("CAREER_ADMIN_TOKEN not set; admin routes are disabled");
    }

    let state = AppState::new(orchestrator, feedback, metrics, args.admin_token.as_deref());
    ApiServer::new(state, args.bind).start().await?;

    Ok(())
}
