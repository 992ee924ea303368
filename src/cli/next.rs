//! Next command - run one resolution and print the single outcome

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use anstream::println;
use dialoguer::{Confirm, Select};
use indicatif::ProgressBar;

use crate::cli::context::{CommandContext, ContextResult};
use crate::cli::style::{arrow, check, spinner_style, Stylize};
use nudge::decision::resume_decision;
use nudge::error::{Error, Result};
use nudge::resolve::resolve_next;
use nudge::state::EnforcementMode;
use nudge::types::{
    ActionKind, Category, NextAction, PendingDecision, Priority, Resolution, ResolutionReport,
};

/// Options for the next command
#[derive(Debug, Clone, Default)]
pub struct NextOptions {
    /// Emit the resolution report as JSON
    pub json: bool,
    /// Read-only: report without applying auto-mode actions
    pub dry_run: bool,
    /// Skip the confirmation prompt before auto-mode actions
    pub yes: bool,
}

/// Run the next command
pub async fn run_next(path: &Path, options: NextOptions) -> Result<()> {
    let mut ctx = match CommandContext::new(path)? {
        ContextResult::Ready(ctx) => ctx,
        ContextResult::ConfigMissing(request) => {
            let report = ResolutionReport {
                resolution: Resolution::ConfigRequired(request),
                automatic_actions: Vec::new(),
                issues_found: Vec::new(),
                suggestions: Vec::new(),
            };
            emit_report(&report, options.json)?;
            return Ok(());
        }
    };

    // Auto-mode actions mutate; confirm before applying unless told not to.
    // JSON mode never prompts.
    let auto_pending = ctx.state.pending_with_mode(EnforcementMode::Auto).len();
    let mut suppress_enforcement = options.dry_run;
    if auto_pending > 0 && !suppress_enforcement && !options.yes && !options.json {
        let proceed = Confirm::new()
            .with_prompt(format!("Apply {auto_pending} automatic action(s)?"))
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("failed to read confirmation: {e}")))?;
        if !proceed {
            suppress_enforcement = true;
        }
    }

    let spinner = if options.json {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message("gathering repository and host facts...");
        Some(pb)
    };

    let outcome = resolve_next(
        &ctx.repo,
        &ctx.host,
        &mut ctx.state,
        &ctx.config.epic_label,
        suppress_enforcement,
    )
    .await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let report = outcome?;
    ctx.save_state()?;

    emit_report(&report, options.json)?;

    // On a terminal, a deferred decision can be settled on the spot
    if let Resolution::Decision(decision) = &report.resolution {
        if !options.json && !options.dry_run && std::io::stdin().is_terminal() {
            offer_decision(&mut ctx, decision).await?;
        }
    }

    Ok(())
}

fn emit_report(report: &ResolutionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match &report.resolution {
        Resolution::Action(next) => print_action(next),
        Resolution::Decision(decision) => print_decision(decision),
        Resolution::ConfigRequired(request) => {
            println!("{}", "Configuration incomplete".warn());
            for field in &request.missing {
                println!("  {} {}", arrow(), field.accent());
            }
            println!(
                "{}",
                "Set these in ~/.config/nudge/config.toml, .nudge.toml, or NUDGE_* env vars"
                    .muted()
            );
        }
    }

    if !report.automatic_actions.is_empty() {
        println!();
        for entry in &report.automatic_actions {
            println!("{} {}", check(), entry);
        }
    }
    if !report.issues_found.is_empty() {
        println!();
        for entry in &report.issues_found {
            println!("{} {}", "!".warn(), entry);
        }
    }
    if !report.suggestions.is_empty() {
        println!();
        for entry in &report.suggestions {
            println!("{} {}", arrow(), entry.muted());
        }
    }

    Ok(())
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "urgent",
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Immediate => "immediate",
        Category::NextLogical => "next logical",
        Category::Optional => "optional",
    }
}

#[allow(clippy::too_many_lines)]
fn print_action(next: &NextAction) {
    let tag = format!(
        "({}, {})",
        priority_label(next.priority),
        category_label(next.category)
    );

    match &next.kind {
        ActionKind::FixCiFailures {
            pr_number,
            pr_title,
            failed_checks,
        } => {
            println!(
                "{} {} {} {}",
                "Fix failing CI on".emphasis(),
                format!("PR #{pr_number}").accent(),
                pr_title,
                tag.muted()
            );
            for name in failed_checks {
                println!("  {} {}", "✗".alert(), name);
            }
        }
        ActionKind::AddressPrFeedback {
            pr_number,
            pr_title,
            changes_requested,
            unresolved_threads,
        } => {
            println!(
                "{} {} {} {}",
                "Address feedback on".emphasis(),
                format!("PR #{pr_number}").accent(),
                pr_title,
                tag.muted()
            );
            if *changes_requested {
                println!("  {} {}", "!".warn(), "a reviewer requested changes");
            }
            if *unresolved_threads > 0 {
                println!(
                    "  {} {unresolved_threads} unresolved comment thread(s)",
                    "!".warn()
                );
            }
        }
        ActionKind::WaitForReview {
            pr_number,
            pr_title,
        } => {
            println!(
                "{} {} {} {}",
                "Waiting for review on".emphasis(),
                format!("PR #{pr_number}").accent(),
                pr_title,
                tag.muted()
            );
        }
        ActionKind::MergePr {
            pr_number,
            pr_title,
        } => {
            println!(
                "{} {} {} {}",
                "Merge".emphasis(),
                format!("PR #{pr_number}").accent(),
                pr_title,
                tag.muted()
            );
        }
        ActionKind::MergeBlocked {
            pr_number,
            pr_title,
            blocking_reasons,
        } => {
            println!(
                "{} {} {} {}",
                "Merge blocked for".emphasis(),
                format!("PR #{pr_number}").accent(),
                pr_title,
                tag.muted()
            );
            for reason in blocking_reasons {
                println!("  {} {}", "✗".alert(), reason);
            }
        }
        ActionKind::ReviewPr {
            pr_number,
            pr_title,
            author,
        } => {
            println!(
                "{} {} {} {} {}",
                "Review".emphasis(),
                format!("PR #{pr_number}").accent(),
                pr_title,
                format!("by {author}").muted(),
                tag.muted()
            );
        }
        ActionKind::SelectWork {
            instruction,
            uncommitted_paths,
        } => {
            println!("{} {}", instruction.emphasis(), tag.muted());
            if !uncommitted_paths.is_empty() {
                println!("{}", "Uncommitted changes to handle first:".warn());
                for path in uncommitted_paths {
                    println!("  {} {}", arrow(), path);
                }
            }
        }
        ActionKind::CompleteEpic {
            epic_number,
            epic_title,
        } => {
            println!(
                "{} {} {} {}",
                "All sub-issues closed; complete".emphasis(),
                format!("Epic #{epic_number}").accent(),
                epic_title,
                tag.muted()
            );
        }
        ActionKind::EpicAnalysis {
            epic_number,
            issue_number,
            issue_title,
        } => {
            println!(
                "{} {} {} {} {}",
                "Analyze".emphasis(),
                format!("issue #{issue_number}").accent(),
                issue_title,
                format!("(last open sub-issue of Epic #{epic_number})").muted(),
                tag.muted()
            );
        }
        ActionKind::StartNewWork {
            issue_number,
            issue_title,
        } => {
            println!(
                "{} {} {} {}",
                "Start".emphasis(),
                format!("issue #{issue_number}").accent(),
                issue_title,
                tag.muted()
            );
        }
        ActionKind::WorkOnTodo {
            issue_number,
            todo_text,
            total_todos,
            completed_todos,
            ..
        } => {
            println!(
                "{} {} {}",
                "Next todo on".emphasis(),
                format!("issue #{issue_number}").accent(),
                tag.muted()
            );
            println!("  {} {}", arrow(), todo_text);
            println!(
                "{}",
                format!("  {completed_todos}/{total_todos} done").muted()
            );
        }
        ActionKind::TodosComplete { instruction, .. } => {
            println!("{} {}", instruction.emphasis(), tag.muted());
        }
    }
}

fn print_decision(decision: &PendingDecision) {
    println!("{}", decision.prompt.emphasis());
    for choice in &decision.choices {
        let meta = choice
            .metadata
            .get("labels")
            .map(|labels| format!(" [{labels}]"))
            .unwrap_or_default();
        println!(
            "  {} {} {}{}",
            arrow(),
            choice.id.accent(),
            choice.title,
            meta.muted()
        );
    }
    println!(
        "{}",
        format!(
            "Resume with: nudge decide {} <choice-id>",
            decision.decision_id
        )
        .muted()
    );
}

/// Offer the decision's choices interactively and apply the selection
async fn offer_decision(ctx: &mut CommandContext, decision: &PendingDecision) -> Result<()> {
    let mut items: Vec<String> = decision
        .choices
        .iter()
        .map(|c| format!("{} - {}", c.id, c.title))
        .collect();
    items.push("decide later".to_string());

    let selected = Select::new()
        .with_prompt("Pick one")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| Error::Internal(format!("failed to read selection: {e}")))?;

    if selected >= decision.choices.len() {
        println!("{}", "Deferred".muted());
        return Ok(());
    }

    let choice = &decision.choices[selected];
    let applied = resume_decision(
        &ctx.host,
        &ctx.repo,
        &mut ctx.state,
        &ctx.config.epic_label,
        &decision.decision_id,
        &choice.id,
        None,
    )
    .await?;
    ctx.save_state()?;

    println!(
        "{} {} {} {}",
        check(),
        "started".success(),
        format!("issue #{}", applied.issue_number).accent(),
        format!("on branch {}", applied.branch).muted()
    );
    Ok(())
}
