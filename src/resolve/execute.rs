//! Enforcement execution - effectful operations
//!
//! Takes an `EnforcementPlan` produced by the pure cascade and applies it
//! through the host provider. Each step is settled in the workflow state:
//! completed on success (or when already satisfied), failure recorded
//! otherwise so the next resolution can surface it. Failures never abort the
//! resolution.

use chrono::Utc;
use tracing::{debug, warn};

use crate::provider::HostProvider;
use crate::resolve::plan::{EnforcementOp, EnforcementPlan};
use crate::state::{Phase, WorkflowState};
use crate::types::{CheckSummary, MergeableState, PrFacts, ReviewSummary};

/// What executing a plan did
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Human-readable descriptions of applied mutations
    pub applied: Vec<String>,
    /// Descriptions of steps that failed
    pub failed: Vec<String>,
    /// Facts for a PR created by the plan, so the snapshot can be patched
    /// without a refetch
    pub created_pr: Option<PrFacts>,
}

/// Execute an enforcement plan (EFFECTFUL)
pub async fn execute_plan(
    host: &dyn HostProvider,
    state: &mut WorkflowState,
    actor: &str,
    plan: &EnforcementPlan,
) -> ExecutionResult {
    let mut result = ExecutionResult::default();

    for step in &plan.steps {
        let now = Utc::now();
        match &step.op {
            EnforcementOp::CreatePr {
                head,
                base,
                title,
                body,
            } => match host.create_pr(head, base, title, body.as_deref()).await {
                Ok(number) => {
                    debug!(pr_number = number, head, "auto-created PR");
                    state.complete(step.action_type, now);
                    state.phase = Phase::PrCreated;
                    result
                        .applied
                        .push(format!("created PR #{number} for '{head}'"));
                    result.created_pr = Some(PrFacts {
                        number,
                        title: title.clone(),
                        author: actor.to_string(),
                        head_ref: head.clone(),
                        base_ref: base.clone(),
                        is_draft: false,
                        updated_at: now,
                        mergeable: None,
                        mergeable_state: MergeableState::Unknown,
                        // No checks yet; an empty review summary is accurate
                        // for a PR created this instant
                        checks: Some(CheckSummary::default()),
                        reviews: Some(ReviewSummary::default()),
                        html_url: String::new(),
                    });
                }
                Err(e) => {
                    warn!(head, error = %e, "auto PR creation failed");
                    state.record_failure(step.action_type, &e.to_string());
                    result
                        .failed
                        .push(format!("could not create PR for '{head}': {e}"));
                }
            },
            EnforcementOp::SetBoardStatus {
                issue_number,
                status,
            } => match host.set_board_status(*issue_number, status.clone()).await {
                Ok(()) => {
                    debug!(issue_number, ?status, "auto-synced board status");
                    state.complete(step.action_type, now);
                    result.applied.push(format!(
                        "moved issue #{issue_number} to {status:?} on the board"
                    ));
                }
                Err(e) => {
                    warn!(issue_number, error = %e, "board status sync failed");
                    state.record_failure(step.action_type, &e.to_string());
                    result.failed.push(format!(
                        "could not move issue #{issue_number} on the board: {e}"
                    ));
                }
            },
            EnforcementOp::AlreadySatisfied { note } => {
                debug!(action = %step.action_type, note, "requirement already satisfied");
                state.complete(step.action_type, now);
                result
                    .applied
                    .push(format!("{}: {note}", step.action_type));
            }
        }
    }

    result
}
