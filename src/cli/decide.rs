//! Decide command - resume a deferred decision

use std::path::Path;

use anstream::println;

use crate::cli::context::{CommandContext, ContextResult};
use crate::cli::style::{arrow, check, Stylize};
use nudge::decision::resume_decision;
use nudge::error::{Error, Result};

/// Options for the decide command
#[derive(Debug, Clone, Default)]
pub struct DecideOptions {
    /// Emit the applied effects as JSON
    pub json: bool,
    /// Free-form reason recorded with the selection
    pub reason: Option<String>,
}

/// Run the decide command
pub async fn run_decide(
    path: &Path,
    decision_id: &str,
    choice: &str,
    options: DecideOptions,
) -> Result<()> {
    let mut ctx = match CommandContext::new(path)? {
        ContextResult::Ready(ctx) => ctx,
        ContextResult::ConfigMissing(request) => {
            return Err(Error::ConfigIncomplete(request.missing));
        }
    };

    let applied = resume_decision(
        &ctx.host,
        &ctx.repo,
        &mut ctx.state,
        &ctx.config.epic_label,
        decision_id,
        choice,
        options.reason.as_deref(),
    )
    .await?;
    ctx.save_state()?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&applied)?);
        return Ok(());
    }

    println!(
        "{} {} {} {}",
        check(),
        "Started".success(),
        format!("issue #{}", applied.issue_number).accent(),
        applied.issue_title
    );
    println!("  {} branch {}", arrow(), applied.branch.accent());
    if applied.assigned {
        println!("  {} assigned to you", arrow());
    }
    if applied.status_updated {
        println!("  {} board status moved to in progress", arrow());
    } else {
        println!(
            "  {} {}",
            "!".warn(),
            "board status was not updated; move it manually".muted()
        );
    }

    Ok(())
}
