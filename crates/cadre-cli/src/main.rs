mod config;
mod demo;

use cadre_agents::AgentManager;
use cadre_core::Invocation;
use cadre_llm::{LlmClient, LlmDecomposer};
use cadre_memory::{Conversation, MemoryManager};
use cadre_orchestrator::{Assignment, PollOutcome, ReasoningEngine, RedecomposeOnFailure};
use clap::{Parser, Subcommand};
use config::CadreConfig;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadre", about = "Cadre: LLM-driven agent orchestration")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "cadre.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose an objective into tasks and execute them
    Run {
        /// What to achieve, in natural language
        objective: String,
    },
    /// Print the agent catalogue shown to the model
    Agents,
    /// Poll a capability until one of its result fields equals a value
    Watch {
        /// Agent to poll
        agent: String,
        /// Capability to invoke
        capability: String,
        /// Result field to inspect
        #[arg(long, default_value = "result")]
        field: String,
        /// Expected value (parsed as JSON, otherwise taken as a string)
        #[arg(long)]
        equals: String,
        /// Input passed on every poll (JSON)
        #[arg(long)]
        input: Option<String>,
        /// Delay between polls in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

fn parse_json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = CadreConfig::load(&cli.config).await?;

    let mut manager =
        AgentManager::new().with_expected_input_type(config.dispatch.expected_input_type.clone());
    if let Some(timeout) = config.dispatch.timeout() {
        manager = manager.with_dispatch_timeout(timeout);
    }
    demo::register_demo_agents(&manager)?;
    let manager = Arc::new(manager);
    info!(agents = manager.agent_count(), "Demo agents registered");

    match cli.command {
        Commands::Run { objective } => {
            let model = config.resolved_model()?;
            let memory = Arc::new(MemoryManager::from_config(&config.memory).await?);

            let decomposer =
                LlmDecomposer::new(LlmClient::new(model)).with_catalogue(manager.describe());
            let mut engine = ReasoningEngine::new(manager.clone(), Arc::new(decomposer))
                .with_context(memory.clone())
                .with_policy(RedecomposeOnFailure)
                .with_config(config.reasoning);

            let report = engine.run(&objective).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            let answer = report
                .last_result
                .as_ref()
                .map(|r| r.to_value().to_string())
                .unwrap_or_default();
            memory
                .add_conversation(Conversation {
                    question: objective,
                    answer,
                    agents: manager.agent_names(),
                    reason: format!("{:?}", report.outcome),
                })
                .await?;
        }
        Commands::Agents => {
            if manager.agent_count() == 0 {
                println!("No agents registered.");
            } else {
                println!("{}", manager.describe());
            }
        }
        Commands::Watch {
            agent,
            capability,
            field,
            equals,
            input,
            interval_ms,
        } => {
            let expected = parse_json_or_string(&equals);
            let input = input
                .as_deref()
                .map(parse_json_or_string)
                .unwrap_or(Value::Null);
            let assignment = Arc::new(
                Assignment::new(
                    format!("watch-{agent}-{capability}"),
                    format!("Wait until {field} equals {expected}"),
                    manager.clone(),
                    agent,
                    capability,
                )
                .with_invocation(Invocation::new(input)),
            );
            println!("{}", assignment.describe());

            let mut handle = assignment.spawn(
                Duration::from_millis(interval_ms),
                move |r| r.field(&field) == Some(&expected),
                || println!("Condition met."),
            );

            let outcome = tokio::select! {
                joined = &mut handle => joined?,
                _ = tokio::signal::ctrl_c() => {
                    warn!("Interrupted, stopping assignment");
                    assignment.stop();
                    handle.await?
                }
            };
            match outcome {
                PollOutcome::Matched { polls } => info!(polls, "Assignment matched"),
                PollOutcome::Cancelled { polls } => info!(polls, "Assignment cancelled"),
                PollOutcome::AlreadyStopped => info!("Assignment was already stopped"),
            }
        }
    }

    Ok(())
}
