//! Agent runner
//!
//! Runs the full agent cycle, a single agent, the status report, or the
//! cron scheduler against the community database. Results are printed as
//! JSON (or written to `--output-file`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use agents_core::common::Record;
use agents_core::kernel::{start_scheduler, AgentDeps};
use agents_core::pipeline::{Orchestrator, OrchestratorConfig, StageName};
use agents_core::Config;
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run every agent in dependency order
    Full,
    SupplyDemand,
    /// Accepts a snapshot list or {"sync_data": [...]} as input
    OrgSync,
    VolunteerMatch,
    EventAnalysis,
    /// Print orchestrator and agent status
    Status,
    /// Run full cycles on the configured cron schedule until Ctrl-C
    Schedule,
}

impl Mode {
    fn stage(self) -> Option<StageName> {
        match self {
            Mode::SupplyDemand => Some(StageName::SupplyDemand),
            Mode::OrgSync => Some(StageName::OrgSync),
            Mode::VolunteerMatch => Some(StageName::VolunteerMatch),
            Mode::EventAnalysis => Some(StageName::EventAnalysis),
            Mode::Full | Mode::Status | Mode::Schedule => None,
        }
    }
}

#[derive(Parser)]
#[command(name = "agent_runner")]
#[command(about = "Community needs agent runner")]
struct Cli {
    #[arg(long, value_enum, default_value_t = Mode::Full)]
    mode: Mode,

    /// JSON file with input data
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// JSON file to save results
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug"
    } else {
        "info,agents_core=debug"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Agent runner failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;

    let pool_options = PgPoolOptions::new().max_connections(config.database_max_connections);
    let pool = if cli.mode == Mode::Status {
        // status never queries
        pool_options
            .connect_lazy(&config.database_url)
            .context("Invalid DATABASE_URL")?
    } else {
        pool_options
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?
    };

    let orchestrator = Arc::new(Orchestrator::new(
        AgentDeps::postgres(pool),
        OrchestratorConfig::from(&config),
    ));

    let input = match &cli.input_file {
        Some(path) => Some(read_input(path, cli.mode)?),
        None => None,
    };

    let output = match cli.mode {
        Mode::Full => {
            tracing::info!("Starting full agent cycle");
            serde_json::to_value(orchestrator.run_full_cycle(input).await)?
        }
        Mode::Status => serde_json::to_value(orchestrator.system_status())?,
        Mode::Schedule => {
            let mut scheduler = start_scheduler(orchestrator.clone(), &config.cycle_schedule).await?;
            tracing::info!(schedule = %config.cycle_schedule, "Scheduler running, press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            scheduler
                .shutdown()
                .await
                .context("Failed to stop scheduler")?;
            tracing::info!("Scheduler stopped");
            return Ok(());
        }
        single => {
            let Some(stage) = single.stage() else {
                bail!("mode {single:?} does not name an agent");
            };
            tracing::info!(agent = %stage, "Running single agent");
            serde_json::to_value(orchestrator.run_single_agent(stage.as_str(), input).await)?
        }
    };

    write_output(&output, cli.output_file.as_deref())
}

/// Input files hold a JSON object. For org sync a bare snapshot list is
/// accepted and wrapped as `sync_data`.
fn read_input(path: &Path, mode: Mode) -> Result<Record> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Input file {} is not valid JSON", path.display()))?;

    match value {
        Value::Object(record) => Ok(record),
        Value::Array(_) if mode == Mode::OrgSync => {
            let mut record = Record::new();
            record.insert("sync_data".into(), value);
            Ok(record)
        }
        _ => bail!("Input file {} must contain a JSON object", path.display()),
    }
}

fn write_output(output: &Value, path: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(output)?;
    match path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Results saved to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
