use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use foreman::init::QUICK_AUTO_ADVANCE;

mod cmd;

#[derive(Parser)]
#[command(name = "foreman")]
#[command(
    version,
    about = "Stage-gated development workflow: requirements, design, phases, implementation"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to confirmation prompts
    #[arg(long, global = true)]
    pub yes: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new foreman project
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
        /// Workflow preset: minimal, light, full (aliases: nightly, product)
        #[arg(long)]
        preset: Option<String>,
        /// Shorthand for --preset minimal
        #[arg(long)]
        quick: bool,
        /// Enable test-driven development briefs
        #[arg(long)]
        tdd: bool,
        /// Custom stage list, e.g. requirements,implementation
        #[arg(long, value_delimiter = ',')]
        workflow: Option<Vec<String>>,
    },
    /// Start a quick project for a single task: requirements, then implementation
    Quick {
        /// What to build
        task: String,
        #[arg(long)]
        name: Option<String>,
        /// Auto-advance confidence threshold (0-100)
        #[arg(long, default_value_t = QUICK_AUTO_ADVANCE, value_parser = clap::value_parser!(u8).range(0..=100))]
        auto_advance: u8,
        /// Approve requirements and write briefs/impl.md right away
        #[arg(long)]
        brief: bool,
    },
    /// Show the current stage, gates and phases
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Validate, approve or reject a stage gate
    Gate {
        /// Stage to check (defaults to the current stage)
        stage: Option<String>,
        /// Approve a gate waiting for review
        #[arg(long, conflicts_with_all = ["reject", "reviewer", "review"])]
        approve: bool,
        /// Reject a gate waiting for review
        #[arg(long, conflicts_with_all = ["reviewer", "review"])]
        reject: bool,
        /// Reason recorded with a rejection
        #[arg(long, requires = "reject")]
        reason: Option<String>,
        /// Route the gate to a reviewer: auto or human
        #[arg(long, conflicts_with = "review")]
        reviewer: Option<String>,
        /// Agent-reported confidence (0-100) checked against the auto-advance threshold
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        confidence: Option<u8>,
        /// Review a pending gate interactively
        #[arg(long)]
        review: bool,
    },
    /// Set the status of a phase: planned, in-progress, done
    Phase { name: String, status: String },
    /// List phases discovered under .foreman/phases/
    Phases,
    /// Generate a brief for a phase, or `impl` for the quick implementation brief
    Brief { name: String },
    /// View, edit or validate foreman.toml
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Watch the project and report stage and phase changes
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a value, e.g. `reviewers.design human`
    Set { key: String, value: String },
    /// Validate configuration
    Validate,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init {
            name,
            preset,
            quick,
            tdd,
            workflow,
        } => cmd::cmd_init(
            &project_dir,
            name.as_deref(),
            preset.as_deref(),
            *quick,
            *tdd,
            workflow.as_deref(),
        )?,
        Commands::Quick {
            task,
            name,
            auto_advance,
            brief,
        } => cmd::cmd_quick(&project_dir, task, name.as_deref(), *auto_advance, *brief)?,
        Commands::Status { json } => cmd::cmd_status(&project_dir, &cli, *json)?,
        Commands::Gate {
            stage,
            approve,
            reject,
            reason,
            reviewer,
            confidence,
            review,
        } => {
            let action = if *approve {
                cmd::GateAction::Approve
            } else if *reject {
                cmd::GateAction::Reject {
                    reason: reason.clone().unwrap_or_default(),
                }
            } else if let Some(reviewer) = reviewer {
                cmd::GateAction::SetReviewer(reviewer.clone())
            } else if *review {
                cmd::GateAction::Review
            } else if let Some(confidence) = confidence {
                cmd::GateAction::Confidence(*confidence)
            } else {
                cmd::GateAction::Validate
            };
            cmd::cmd_gate(&project_dir, &cli, stage.as_deref(), action)?
        }
        Commands::Phase { name, status } => cmd::cmd_phase(&project_dir, &cli, name, status)?,
        Commands::Phases => cmd::cmd_phases(&project_dir, &cli)?,
        Commands::Brief { name } => cmd::cmd_brief(&project_dir, &cli, name)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, &cli, command.clone())?,
        Commands::Watch { interval } => cmd::cmd_watch(&project_dir, &cli, *interval).await?,
    }

    Ok(())
}
