use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use model_dispatch::config::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};
use model_dispatch::{probe_catalog, ConversationTurn, Dispatcher, TaskCategory};

#[derive(Parser)]
#[command(
    name = "model-dispatch",
    about = "Ordered-fallback client for hosted chat-completion models"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe every configured candidate and report health.
    Preflight,
    /// Send a single prompt through the fallback chain.
    Ask {
        /// The user prompt.
        prompt: String,
        /// Task flavor selecting the fallback order.
        #[arg(long, value_enum, default_value = "coding")]
        category: CategoryArg,
        /// Requested output-token cap (clamped per candidate).
        #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
        max_tokens: u32,
        /// Sampling temperature.
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f64,
        /// Optional system preamble.
        #[arg(long)]
        system: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Reasoning,
    Coding,
}

impl From<CategoryArg> for TaskCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Reasoning => TaskCategory::Reasoning,
            CategoryArg::Coding => TaskCategory::Coding,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let dispatcher = Dispatcher::from_env()?;

    match cli.command {
        Command::Preflight => {
            let report = probe_catalog(&dispatcher).await?;
            for result in &report.results {
                info!(
                    model = %result.model,
                    healthy = result.healthy,
                    latency_ms = result.latency_ms,
                    error = result.error.as_deref().unwrap_or(""),
                    "probe"
                );
            }
            if !report.any_healthy() {
                anyhow::bail!("no candidate is reachable");
            }
            info!(
                healthy = report.healthy_models().len(),
                total = report.results.len(),
                "preflight passed"
            );
        }
        Command::Ask {
            prompt,
            category,
            max_tokens,
            temperature,
            system,
        } => {
            let mut conversation = Vec::new();
            if let Some(system) = system {
                conversation.push(ConversationTurn::system(system));
            }
            conversation.push(ConversationTurn::user(prompt));

            let outcome = dispatcher
                .dispatch(&conversation, category.into(), max_tokens, temperature)
                .await?;
            info!(
                model = %outcome.candidate.id,
                attempt = outcome.attempt_index,
                used_fallback = outcome.used_fallback,
                "dispatch complete"
            );
            println!("{}", outcome.content().unwrap_or_default());
        }
    }

    Ok(())
}
