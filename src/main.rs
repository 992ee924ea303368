//! nudge binary entry point

mod cli;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{DecideOptions, NextOptions};

#[derive(Parser)]
#[command(
    name = "nudge",
    about = "Deterministic next-action resolver for delivery work",
    version
)]
struct Cli {
    /// Working copy to operate on (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "PATH")]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve and print the single next action
    Next {
        /// Emit the resolution report as JSON
        #[arg(long)]
        json: bool,
        /// Report without applying auto-mode actions
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt before auto-mode actions
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Resume a deferred decision with a selected choice
    Decide {
        /// The decision id ("decision-<millis>")
        decision_id: String,
        /// The selected choice id ("issue-<n>")
        choice_id: String,
        /// Free-form reason recorded with the selection
        #[arg(long)]
        reason: Option<String>,
        /// Emit the applied effects as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or reset the persisted workflow record
    State {
        #[command(subcommand)]
        command: StateCommand,
    },
}

#[derive(Subcommand)]
enum StateCommand {
    /// Print the workflow record
    Show {
        /// Emit the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset the workflow record to defaults
    Reset,
    /// Set the enforcement mode for a required action type
    Policy {
        /// Action type (create_pr or sync_board_status)
        action: String,
        /// Enforcement mode (auto, suggest, or warn)
        mode: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();
    let path = args
        .path
        .map_or_else(|| std::env::current_dir().map_err(anyhow::Error::from), Ok)?;

    match args.command {
        Command::Next { json, dry_run, yes } => {
            cli::run_next(&path, NextOptions { json, dry_run, yes }).await?;
        }
        Command::Decide {
            decision_id,
            choice_id,
            reason,
            json,
        } => {
            cli::run_decide(&path, &decision_id, &choice_id, DecideOptions { json, reason })
                .await?;
        }
        Command::State { command } => match command {
            StateCommand::Show { json } => cli::run_state_show(&path, json)?,
            StateCommand::Reset => cli::run_state_reset(&path)?,
            StateCommand::Policy { action, mode } => cli::run_state_policy(&path, &action, &mode)?,
        },
    }

    Ok(())
}
