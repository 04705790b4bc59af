//! Mnemoroute - capability-aware routing of memory operations across LLM backends
//!
//! Command-line companion for inspecting the capability catalog and
//! configuration, and for dry-running memory operations offline.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mnemoroute::{
    backend::{EnvCredentials, OfflineFactory},
    capability::OperationKind,
    config::MnemoConfig,
    diagnostics::MemorySink,
    Orchestrator,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mnemoroute")]
#[command(author = "Mnemoroute Team")]
#[command(version)]
#[command(about = "Capability-aware routing of memory operations across LLM backends")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MNEMOROUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what the catalog knows about a model
    Caps {
        /// Model identifier
        model: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },

    /// Run one memory operation offline (every backend call degrades)
    Run {
        /// Operation: similarity, importance, summarization, abstraction or clustering
        operation: String,

        /// Operation input; similarity takes two, importance joins all
        #[arg(required = true)]
        input: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mnemoroute={}", log_level).into());
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = MnemoConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Caps { model } => {
            show_caps(&config, &model)?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
        Commands::Run { operation, input } => {
            run_operation(&config, &operation, input).await?;
        }
    }

    Ok(())
}

fn show_caps(config: &MnemoConfig, model: &str) -> Result<()> {
    match config.capability_catalog().resolve(model) {
        Some(hit) => println!("{}", serde_json::to_string_pretty(&hit)?),
        None => {
            println!("Model '{}' is not in the capability catalog.", model);
            println!("Unknown models are assumed capable of everything except reliable numeric rating.");
        }
    }
    Ok(())
}

fn show_config(config: Option<&MnemoConfig>) -> Result<()> {
    let default_config = MnemoConfig::default();
    let config = config.unwrap_or(&default_config);
    println!("{}", config.to_toml_string()?);
    Ok(())
}

async fn run_operation(config: &MnemoConfig, operation: &str, input: Vec<String>) -> Result<()> {
    let Some(kind) = OperationKind::parse(operation) else {
        bail!("unknown operation '{}'", operation);
    };

    let sink = Arc::new(MemorySink::new());
    let orchestrator = Orchestrator::from_config(
        config,
        Arc::new(OfflineFactory),
        Arc::new(EnvCredentials),
        sink.clone(),
    )
    .await?;

    tracing::info!(operation = %kind, inputs = input.len(), "Running offline");

    let result = match kind {
        OperationKind::Similarity => {
            let [a, b] = input.as_slice() else {
                bail!("similarity takes exactly two inputs");
            };
            json!(orchestrator.rate_similarity(a, b).await)
        }
        OperationKind::Importance => json!(orchestrator.score_importance(&input.join(" ")).await),
        OperationKind::Summarization => json!(orchestrator.summarize(&input).await),
        OperationKind::Abstraction => json!(orchestrator.abstract_observations(&input).await),
        OperationKind::Clustering => json!(orchestrator.cluster(&input).await),
        OperationKind::General | OperationKind::Embedding => {
            bail!("'{}' has no offline answer", kind);
        }
    };

    let report = json!({
        "operation": kind,
        "result": result,
        "diagnostics": sink.events(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
