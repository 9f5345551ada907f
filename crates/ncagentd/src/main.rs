//! ncagentd entry point.
//!
//! Applies one goal-state message and writes the operation reply as JSON.

use anyhow::Context;
use clap::Parser;
use ncagentd::{
    exit_code_for, init_logging, read_goal_state, write_reply, Agent, AgentConfig, DEFAULT_CONFIG_PATH,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Per-host network control-plane agent
#[derive(Parser, Debug)]
#[command(name = "ncagentd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level, overrides the configuration file (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Maximum concurrent handler calls per resource kind
    #[arg(long)]
    concurrency_ceiling: Option<usize>,

    /// Goal-state JSON file, `-` reads stdin
    goal_state: PathBuf,

    /// Write the reply here instead of stdout
    #[arg(short = 'o', long)]
    reply_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("ncagentd failed: {:#}", e);
            eprintln!("ncagentd: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = AgentConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(ceiling) = args.concurrency_ceiling {
        config.engine.concurrency_ceiling = ceiling;
    }
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging.level, config.logging.json)?;

    info!("--- Starting ncagentd ---");

    let batch = read_goal_state(&args.goal_state)
        .with_context(|| format!("reading goal state from {}", args.goal_state.display()))?;
    info!(resources = batch.resource_count(), shape = ?batch.shape(), "Goal state received");

    let agent = Agent::from_config(&config);
    let (code, reply) = agent.apply(batch).await;

    write_reply(&reply, args.reply_out.as_deref()).context("writing reply")?;

    info!(result = %code, statuses = reply.len(), "--- ncagentd done ---");
    Ok(exit_code_for(code))
}
