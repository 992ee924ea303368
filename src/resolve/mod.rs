//! Priority resolver
//!
//! Functional-core / imperative-shell split:
//! 1. Gather - `build_snapshot` reads all facts (effectful, read-only)
//! 2. Decide - `plan::decide` evaluates the rule cascade (pure, testable)
//! 3. Enforce - `execute::execute_plan` applies auto-mode actions
//!    (effectful), then the cascade runs once more on the patched facts
//!
//! Enforcement fires at most once per resolution, so a failing auto action
//! cannot loop.

mod execute;
mod plan;

pub use execute::{execute_plan, ExecutionResult};
pub use plan::{decide, EnforcementOp, EnforcementPlan, EnforcementStep, Outcome};

use chrono::Utc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::{HostProvider, RepoProvider};
use crate::snapshot::{build_snapshot, WorkflowSnapshot};
use crate::state::{ActionType, EnforcementMode, Phase, WorkflowState};
use crate::types::{ActionKind, Resolution, ResolutionReport};

/// Derive required actions from the gathered facts.
///
/// A work branch with commits and no PR records a `CreatePr` requirement,
/// and an existing PR completes a previously recorded one. A pending
/// `SyncBoardStatus` completes once the board shows the current issue in
/// progress.
fn record_requirements(snapshot: &WorkflowSnapshot, state: &mut WorkflowState) {
    let now = Utc::now();
    let branch = &snapshot.repo.branch;

    if snapshot.pr_for_branch(branch).is_some() {
        if state.complete(ActionType::CreatePr, now) {
            debug!(%branch, "create-pr requirement satisfied by existing PR");
        }
    } else if !snapshot.repo.on_default_branch()
        && snapshot.repo.ahead > 0
        && state.add_required(ActionType::CreatePr, now)
    {
        debug!(%branch, "recorded create-pr requirement");
    }

    if let Some(issue) = state.current_issue {
        let in_progress_on_board = snapshot
            .issues
            .iter()
            .chain(snapshot.epics.iter())
            .any(|i| i.number == issue);
        if in_progress_on_board && state.complete(ActionType::SyncBoardStatus, now) {
            debug!(issue, "board-status requirement satisfied");
        }
    }
}

/// One full resolution: gather, enforce if policy allows, decide.
///
/// With `dry_run` no mutation happens; pending auto-mode actions are
/// reported as suggestions instead of being applied.
pub async fn resolve_next(
    repo: &dyn RepoProvider,
    host: &dyn HostProvider,
    state: &mut WorkflowState,
    epic_label: &str,
    dry_run: bool,
) -> Result<ResolutionReport> {
    let mut snapshot = build_snapshot(repo, host, epic_label).await?;

    // Recording requirements mutates the store, so dry runs skip it
    if !dry_run {
        record_requirements(&snapshot, state);
    }

    let mut automatic_actions = Vec::new();
    let mut issues_found = snapshot.notes.clone();
    let mut suggestions = Vec::new();

    // Pending actions below auto mode never mutate; they only advise
    for pending in state.pending_with_mode(EnforcementMode::Suggest) {
        suggestions.push(format!("required action outstanding: {}", pending.action_type));
    }
    for pending in state.pending_with_mode(EnforcementMode::Warn) {
        issues_found.push(format!("required action outstanding: {}", pending.action_type));
    }

    let outcome = match plan::decide(&snapshot, state, Utc::now(), !dry_run) {
        Outcome::Enforce(enforcement) => {
            if dry_run {
                // Unreachable: enforcement is gated off under dry_run
                return Err(Error::InvariantViolation(
                    "enforcement planned during dry run".to_string(),
                ));
            }
            debug!(steps = enforcement.steps.len(), "executing enforcement plan");
            let executed = execute::execute_plan(host, state, &snapshot.actor, &enforcement).await;
            automatic_actions.extend(executed.applied);
            issues_found.extend(executed.failed);
            if let Some(pr) = executed.created_pr {
                snapshot.prs.push(pr);
            }
            // Decide again on the patched facts, enforcement now spent
            plan::decide(&snapshot, state, Utc::now(), false)
        }
        other => other,
    };

    let resolution = match outcome {
        Outcome::Action(next) => Resolution::Action(next),
        Outcome::Decision(pending) => Resolution::Decision(pending),
        Outcome::Enforce(_) => {
            return Err(Error::InvariantViolation(
                "enforcement planned twice in one resolution".to_string(),
            ));
        }
    };

    // Phase tracks the recorded work item through review
    if !dry_run && state.current_issue.is_some() {
        if let Resolution::Action(next) = &resolution {
            match next.kind {
                ActionKind::WaitForReview { .. }
                | ActionKind::AddressPrFeedback { .. }
                | ActionKind::MergeBlocked { .. } => state.phase = Phase::UnderReview,
                ActionKind::MergePr { .. } => state.phase = Phase::MergeReady,
                _ => {}
            }
        }
    }

    if dry_run {
        for pending in state.pending_with_mode(EnforcementMode::Auto) {
            suggestions.push(format!(
                "would enforce automatically: {}",
                pending.action_type
            ));
        }
    }

    Ok(ResolutionReport {
        resolution,
        automatic_actions,
        issues_found,
        suggestions,
    })
}
