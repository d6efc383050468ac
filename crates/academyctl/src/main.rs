//! MCP Academy control - CLI client for the progress engine.
//!
//! Records completions and inspects XP, levels, streaks, and badges for
//! the local learner account.

mod commands;

use academy_core::AcademyError;
use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "academyctl")]
#[command(about = "MCP Academy - learning progress and achievements", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show XP, level, streak, and earned badges
    Stats,

    /// Record a completed lesson
    Lesson {
        /// Lesson identifier (e.g. "intro-to-mcp")
        id: String,
    },

    /// Record a quiz result
    Quiz {
        /// Quiz identifier
        id: String,

        /// Score achieved (0-100)
        #[arg(long)]
        score: u32,
    },

    /// Toggle a path step
    Step {
        /// Path name (beginner, intermediate, advanced)
        path: String,

        /// Step index within the path
        index: u32,

        /// Mark the step incomplete instead
        #[arg(long)]
        undo: bool,
    },

    /// Show the recent activity feed
    Activity {
        /// Maximum entries to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// List all achievements and their earned state
    Achievements,

    /// Dump all records as JSON
    Export,

    /// Delete all records for this account
    Reset {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Stats => commands::stats(),
        Commands::Lesson { id } => commands::lesson(&id),
        Commands::Quiz { id, score } => commands::quiz(&id, score),
        Commands::Step { path, index, undo } => commands::step(&path, index, undo),
        Commands::Activity { limit } => commands::activity(limit),
        Commands::Achievements => commands::achievements(),
        Commands::Export => commands::export(),
        Commands::Reset { yes } => commands::reset(yes),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run(Cli::parse()) {
        // Caller bugs get flagged as such; everything else is shown as-is.
        match err.downcast_ref::<AcademyError>() {
            Some(e) if !e.is_user_facing() => {
                eprintln!("{} {} (this is a bug, please report it)", "error:".red(), e)
            }
            _ => eprintln!("{} {:#}", "error:".red(), err),
        }
        std::process::exit(1);
    }
}
