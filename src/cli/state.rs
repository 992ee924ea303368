//! State command - inspect or reset the persisted workflow record

use std::path::Path;

use anstream::println;

use crate::cli::style::{arrow, check, Stylize};
use nudge::error::{Error, Result};
use nudge::state::{
    load_state, save_state, state_path, ActionStatus, ActionType, EnforcementMode,
};

/// Print the workflow record for the working copy at `path`
pub fn run_state_show(path: &Path, json: bool) -> Result<()> {
    let root = nudge::provider::GitRepo::open(path, "main")?
        .root()
        .to_path_buf();
    let state = load_state(&root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "State record:".muted(),
        state_path(&root).display()
    );
    match state.current_issue {
        Some(issue) => println!(
            "{} {}",
            "Working".emphasis(),
            format!("issue #{issue}").accent()
        ),
        None => println!("{}", "No work item active".muted()),
    }
    if let Some(branch) = &state.current_branch {
        println!("  {} branch {}", arrow(), branch.accent());
    }
    println!("  {} phase {:?}", arrow(), state.phase);

    if !state.required_actions.is_empty() {
        println!();
        println!("{}", "Required actions:".emphasis());
        for action in &state.required_actions {
            let mode = state.mode_for(action.action_type);
            let status = match action.status {
                ActionStatus::Pending => "pending".warn(),
                ActionStatus::Completed => "completed".success(),
                ActionStatus::Failed => "failed".alert(),
            };
            println!("  {} {} ({mode:?}, {status})", arrow(), action.action_type);
            if let Some(reason) = &action.failure_reason {
                println!("    {} last failure: {reason}", "!".warn());
            }
        }
    }
    if !state.completed_actions.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} action(s) completed", state.completed_actions.len()).muted()
        );
    }

    Ok(())
}

/// Set the enforcement mode for an action type
pub fn run_state_policy(path: &Path, action: &str, mode: &str) -> Result<()> {
    let Some(action_type) = ActionType::parse(action) else {
        return Err(Error::State(format!(
            "unknown action type '{action}' (expected create_pr or sync_board_status)"
        )));
    };
    let Some(mode) = EnforcementMode::parse(mode) else {
        return Err(Error::State(format!(
            "unknown enforcement mode '{mode}' (expected auto, suggest, or warn)"
        )));
    };

    let root = nudge::provider::GitRepo::open(path, "main")?
        .root()
        .to_path_buf();
    let mut state = load_state(&root)?;
    state.set_policy(action_type, mode);
    save_state(&root, &state)?;

    println!(
        "{} {} {} {:?}",
        check(),
        action_type,
        "enforced as".muted(),
        mode
    );
    Ok(())
}

/// Reset the workflow record to defaults
pub fn run_state_reset(path: &Path) -> Result<()> {
    let root = nudge::provider::GitRepo::open(path, "main")?
        .root()
        .to_path_buf();
    let mut state = load_state(&root)?;
    state.reset();
    save_state(&root, &state)?;
    println!("{} {}", check(), "State reset to defaults");
    Ok(())
}
