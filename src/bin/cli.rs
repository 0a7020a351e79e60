//! Career Advisor CLI
//!
//! Interactive chat in the terminal plus the admin views over the ledgers.

use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use career_advisor::agent::{ChatOrchestrator, ChatSession};
use career_advisor::completion::OpenAiCompatibleClient;
use career_advisor::error::Result;
use career_advisor::storage::{FeedbackLedger, MetricsLedger, MAX_DAILY_DAYS};
use career_advisor::types::*;

#[derive(Parser)]
#[command(name = "career-cli")]
#[command(about = "Career advisor chat and admin CLI")]
#[command(version)]
struct Cli {
    /// Directory holding feedback.json and metrics.json
    #[arg(long, env = "CAREER_DATA_DIR", default_value = "data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the advisor
    Chat,
    /// Submit feedback
    Feedback {
        /// Feedback content
        content: String,
        /// Feedback type, e.g. "Bug报告" or "功能建议"
        #[arg(short, long, default_value = "general_feedback")]
        r#type: String,
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: Option<i64>,
        /// Contact details
        #[arg(short, long)]
        contact: Option<String>,
    },
    /// Feedback summary and rating distribution
    Stats,
    /// Most recent feedback
    Recent {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Feedback of one type
    ByType {
        /// Feedback type (case-insensitive)
        r#type: String,
    },
    /// Aggregate API metrics
    Metrics,
    /// Per-day counters, oldest first (at most 366 days)
    Daily {
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
    /// API calls and sessions within a recent window
    Activity {
        #[arg(long, default_value = "24")]
        hours: i64,
    },
    /// Check API credentials and connectivity
    Ping,
    /// Write all feedback as JSON
    Export {
        /// Output file (- for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Back up and clear all feedback
    Clear,
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn print_feedback(records: &[FeedbackRecord]) {
    if records.is_empty() {
        println!("No feedback yet");
        return;
    }
    for record in records {
        let rating = record
            .rating
            .map(|r| format!("{}/5", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} [{}] {} {} - {}",
            record.id,
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.feedback_type,
            rating,
            truncate(&record.content, 60)
        );
    }
}

fn client() -> Result<OpenAiCompatibleClient> {
    OpenAiCompatibleClient::new(CompletionConfig::from_env()?)
}

async fn chat(metrics: Arc<MetricsLedger>) -> Result<()> {
    let orchestrator = ChatOrchestrator::new(Arc::new(client()?), metrics);
    let mut session = ChatSession::new();

    println!("Career Advisor");
    println!("Commands: /status, /summary, /clear, /quit\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("Conversation cleared");
            }
            "/status" => println!("{}", serde_json::to_string_pretty(&session.status())?),
            "/summary" => println!("{}", serde_json::to_string_pretty(&session.summary())?),
            input => {
                let reply = orchestrator.respond(&mut session, input).await?;
                println!("\n[{}] {}\n", reply.mode, reply.content);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Expand ~ in path
    let store = StoreConfig {
        data_dir: shellexpand::tilde(&cli.data_dir).to_string(),
    };
    let metrics = Arc::new(MetricsLedger::open(store.metrics_path()));
    let feedback = FeedbackLedger::open(store.feedback_path()).with_metrics(metrics.clone());

    match cli.command {
        Commands::Chat => chat(metrics).await?,

        Commands::Feedback {
            content,
            r#type,
            rating,
            contact,
        } => {
            let id = feedback.submit(NewFeedback {
                feedback_type: r#type,
                rating,
                content,
                contact,
            })?;
            println!("Recorded feedback {}", id);
        }

        Commands::Stats => {
            let summary = feedback.stats();
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("Rating distribution:");
            for (rating, count) in feedback.rating_distribution() {
                println!("  {} star: {}", rating, count);
            }
        }

        Commands::Recent { limit } => print_feedback(&feedback.recent(limit)),

        Commands::ByType { r#type } => print_feedback(&feedback.by_type(&r#type)),

        Commands::Metrics => {
            println!(
                "{}",
                serde_json::to_string_pretty(&metrics.performance_metrics())?
            );
        }

        Commands::Daily { days } => {
            if days > MAX_DAILY_DAYS {
                eprintln!("Showing the last {} days", MAX_DAILY_DAYS);
            }
            println!(
                "{:<12} {:>6} {:>6} {:>6} {:>9} {:>8} {:>8}",
                "date", "calls", "ok", "failed", "sessions", "success%", "avg(s)"
            );
            for row in metrics.daily_stats(days) {
                println!(
                    "{:<12} {:>6} {:>6} {:>6} {:>9} {:>8.2} {:>8.2}",
                    row.date,
                    row.api_calls,
                    row.successful_calls,
                    row.failed_calls,
                    row.sessions,
                    row.success_rate,
                    row.average_response_time
                );
            }
        }

        Commands::Activity { hours } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&metrics.recent_activity(hours.max(0)))?
            );
        }

        Commands::Ping => {
            let reply = client()?.ping().await?;
            println!("API reachable: {}", reply);
        }

        Commands::Export { output } => {
            let content = feedback.export()?;
            if output == "-" {
                println!("{}", content);
            } else {
                std::fs::write(&output, content)?;
                println!("Feedback exported to {}", output);
            }
        }

        Commands::Clear => match feedback.clear()? {
            Some(backup) => println!("Feedback cleared, backup at {}", backup.display()),
            None => println!("Feedback cleared"),
        },
    }

    Ok(())
}
