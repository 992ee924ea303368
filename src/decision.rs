//! Deferred-decision protocol
//!
//! A decision is created statelessly: the resolver emits a fresh id and the
//! enumerated choices, and persists nothing. Resumption re-derives everything
//! from the selected choice id, so it works across process restarts and is
//! at-most-once - a choice whose selection the persisted record already shows
//! in effect is rejected as `DecisionNotFound`.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::branch::branch_for_issue;
use crate::error::{Error, Result};
use crate::provider::{HostProvider, RepoProvider};
use crate::state::{ActionType, Phase, WorkflowState};
use crate::types::{AppliedDecision, BoardStatus, DecisionChoice, ProjectItem};

/// Mint a fresh time-derived decision id
pub fn new_decision_id(now: DateTime<Utc>) -> String {
    format!("decision-{}", now.timestamp_millis())
}

/// Choice id for an issue
pub fn choice_id(issue_number: u64) -> String {
    format!("issue-{issue_number}")
}

/// Build a selectable choice from a board item
pub fn choice_for_item(item: &ProjectItem) -> DecisionChoice {
    let mut metadata = std::collections::BTreeMap::new();
    if !item.labels.is_empty() {
        metadata.insert("labels".to_string(), item.labels.join(", "));
    }
    if let Some(status) = &item.board_status {
        metadata.insert("status".to_string(), format!("{status:?}"));
    }
    DecisionChoice {
        id: choice_id(item.number),
        title: item.title.clone(),
        metadata,
    }
}

/// Check a decision id against the `decision-<unix-millis>` grammar
fn validate_decision_id(id: &str) -> bool {
    id.strip_prefix("decision-")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse an `issue-<n>` choice id
fn parse_choice_id(id: &str) -> Option<u64> {
    id.strip_prefix("issue-")?.parse().ok()
}

/// Resume a deferred decision with the selected choice.
///
/// Validates the decision id shape (`DecisionNotFound` on anything else, with
/// no mutation), rejects a choice that matches the work already recorded in
/// the state (the decision was consumed), re-derives the chosen issue from
/// the host (`InvalidChoice` when the issue is absent, closed, an Epic, or
/// already someone else's), then applies the selection: assign to the actor
/// if unassigned, move the board status to "in progress", create or switch
/// to the work branch, and record the work item in the persisted state.
pub async fn resume_decision(
    host: &dyn HostProvider,
    repo: &dyn RepoProvider,
    state: &mut WorkflowState,
    epic_label: &str,
    decision_id: &str,
    choice: &str,
    reason: Option<&str>,
) -> Result<AppliedDecision> {
    if !validate_decision_id(decision_id) {
        return Err(Error::DecisionNotFound(decision_id.to_string()));
    }

    let invalid_choice = || Error::InvalidChoice {
        decision: decision_id.to_string(),
        choice: choice.to_string(),
    };

    let Some(issue_number) = parse_choice_id(choice) else {
        return Err(invalid_choice());
    };

    // The selection is already in effect, so the decision was consumed
    if state.current_issue == Some(issue_number) && state.phase != Phase::Ready {
        return Err(Error::DecisionNotFound(decision_id.to_string()));
    }

    let issue = match host.get_issue(issue_number).await {
        Ok(issue) => issue,
        Err(e) => {
            debug!(issue_number, error = %e, "choice issue could not be fetched");
            return Err(invalid_choice());
        }
    };
    if !issue.is_open {
        return Err(invalid_choice());
    }
    // Epics are containers; their sub-issues are the selectable work
    if issue.is_epic(epic_label) {
        return Err(invalid_choice());
    }

    let actor = host.current_actor().await?;
    if !issue.assignees.is_empty() && !issue.assigned_to(&actor) {
        // Someone else picked it up; the choice is spent
        return Err(invalid_choice());
    }

    if let Some(reason_text) = reason {
        debug!(decision_id, choice, reason = reason_text, "resuming decision");
    }

    let assigned = if issue.assigned_to(&actor) {
        false
    } else {
        host.assign_issue(issue_number, &actor).await?;
        true
    };

    // Board mutation degrades; the caller sees whether it took, and a
    // required action is recorded so a later resolution can retry it
    let status_updated = match host
        .set_board_status(issue_number, BoardStatus::InProgress)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(issue_number, error = %e, "failed to move board status");
            state.add_required(ActionType::SyncBoardStatus, Utc::now());
            false
        }
    };

    let branch = branch_for_issue(issue_number, &issue.title);
    repo.prepare_branch(&branch)?;

    state.current_issue = Some(issue_number);
    state.current_branch = Some(branch.clone());
    state.phase = Phase::Implementation;

    Ok(AppliedDecision {
        issue_number,
        issue_title: issue.title,
        assigned,
        status_updated,
        branch,
    })
}
