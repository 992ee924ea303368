//! Workflow state - the only mutable cross-invocation state in the core
//!
//! A single persisted record per working copy holds the phase marker, the
//! required-action ledger, and the per-action-type enforcement policies.
//! It is mutated only through the transitions defined here, never as a side
//! effect of reading it.

mod store;

pub use store::{load_state, save_state, state_path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current version of the persisted state document
pub const STATE_VERSION: u32 = 1;

/// Named enforcement action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a PR when the work branch has commits and no open PR
    CreatePr,
    /// Move the current issue's board status to match the phase
    SyncBoardStatus,
}

impl ActionType {
    /// Parse a user-supplied action-type name (`-` and `_` both accepted)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "create_pr" => Some(Self::CreatePr),
            "sync_board_status" => Some(Self::SyncBoardStatus),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatePr => write!(f, "create_pr"),
            Self::SyncBoardStatus => write!(f, "sync_board_status"),
        }
    }
}

/// How a required action is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    /// Apply automatically during resolution
    Auto,
    /// Surface as a suggestion; never mutate
    Suggest,
    /// Surface as a warning only
    Warn,
}

impl EnforcementMode {
    /// Parse a user-supplied mode name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "suggest" => Some(Self::Suggest),
            "warn" => Some(Self::Warn),
            _ => None,
        }
    }
}

/// Lifecycle status of a required action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Waiting to be applied or acted on
    Pending,
    /// Applied (see `completed_at`)
    Completed,
    /// Attempted and failed (see `failure_reason`)
    Failed,
}

/// A required enforcement action with audit fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredAction {
    /// The action type; at most one pending instance per type
    pub action_type: ActionType,
    /// Current status
    pub status: ActionStatus,
    /// When the action was recorded
    pub created_at: DateTime<Utc>,
    /// When the action completed, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Why the action failed, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Free-form phase marker for the current piece of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No work item active
    #[default]
    Ready,
    /// Working the issue's checklist
    Implementation,
    /// PR exists for the work branch
    PrCreated,
    /// PR has reviews in flight
    UnderReview,
    /// PR approved and unblocked
    MergeReady,
}

/// The persisted workflow-state document, one per repository working copy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Document version, bumped on layout changes
    #[serde(default)]
    pub version: u32,
    /// Issue currently being worked, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_issue: Option<u64>,
    /// Work branch for that issue, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_branch: Option<String>,
    /// Phase marker
    #[serde(default)]
    pub phase: Phase,
    /// Pending required actions
    #[serde(default)]
    pub required_actions: Vec<RequiredAction>,
    /// Completed-action log
    #[serde(default)]
    pub completed_actions: Vec<RequiredAction>,
    /// Per-action-type enforcement mode
    #[serde(default)]
    pub enforcement_policies: BTreeMap<ActionType, EnforcementMode>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            current_issue: None,
            current_branch: None,
            phase: Phase::Ready,
            required_actions: Vec::new(),
            completed_actions: Vec::new(),
            enforcement_policies: default_policies(),
        }
    }
}

/// Default enforcement policies: nothing is applied automatically until the
/// user opts in
fn default_policies() -> BTreeMap<ActionType, EnforcementMode> {
    let mut map = BTreeMap::new();
    map.insert(ActionType::CreatePr, EnforcementMode::Suggest);
    map.insert(ActionType::SyncBoardStatus, EnforcementMode::Suggest);
    map
}

impl WorkflowState {
    /// Fresh default state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a required action of the given type.
    ///
    /// No-op when a pending action of that type already exists - at most one
    /// pending instance per type. Returns whether an action was added.
    pub fn add_required(&mut self, action_type: ActionType, now: DateTime<Utc>) -> bool {
        if self
            .required_actions
            .iter()
            .any(|a| a.action_type == action_type && a.status == ActionStatus::Pending)
        {
            return false;
        }
        self.required_actions.push(RequiredAction {
            action_type,
            status: ActionStatus::Pending,
            created_at: now,
            completed_at: None,
            failure_reason: None,
        });
        true
    }

    /// Mark the pending action of the given type completed, moving it to the
    /// completed log stamped with the completion time. Returns whether a
    /// pending action was found.
    pub fn complete(&mut self, action_type: ActionType, now: DateTime<Utc>) -> bool {
        let Some(pos) = self
            .required_actions
            .iter()
            .position(|a| a.action_type == action_type && a.status == ActionStatus::Pending)
        else {
            return false;
        };
        let mut action = self.required_actions.remove(pos);
        action.status = ActionStatus::Completed;
        action.completed_at = Some(now);
        self.completed_actions.push(action);
        true
    }

    /// Mark the pending action of the given type failed, keeping it pending
    /// but recording the reason for the next resolution to surface.
    pub fn record_failure(&mut self, action_type: ActionType, reason: &str) {
        if let Some(action) = self
            .required_actions
            .iter_mut()
            .find(|a| a.action_type == action_type && a.status == ActionStatus::Pending)
        {
            action.failure_reason = Some(reason.to_string());
        }
    }

    /// Set the enforcement mode for an action type
    pub fn set_policy(&mut self, action_type: ActionType, mode: EnforcementMode) {
        self.enforcement_policies.insert(action_type, mode);
    }

    /// Effective enforcement mode for an action type
    pub fn mode_for(&self, action_type: ActionType) -> EnforcementMode {
        self.enforcement_policies
            .get(&action_type)
            .copied()
            .unwrap_or(EnforcementMode::Suggest)
    }

    /// Pending actions filtered to the given enforcement mode
    pub fn pending_with_mode(&self, mode: EnforcementMode) -> Vec<&RequiredAction> {
        self.required_actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending && self.mode_for(a.action_type) == mode)
            .collect()
    }

    /// Reset the record to defaults, keeping nothing
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_add_required_is_idempotent_per_type() {
        let mut state = WorkflowState::new();
        assert!(state.add_required(ActionType::CreatePr, now()));
        assert!(!state.add_required(ActionType::CreatePr, now()));
        assert_eq!(state.required_actions.len(), 1);
    }

    #[test]
    fn test_complete_moves_to_log_with_timestamp() {
        let mut state = WorkflowState::new();
        state.add_required(ActionType::CreatePr, now());

        assert!(state.complete(ActionType::CreatePr, now()));
        assert!(state.required_actions.is_empty());
        assert_eq!(state.completed_actions.len(), 1);
        let done = &state.completed_actions[0];
        assert_eq!(done.status, ActionStatus::Completed);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_complete_without_pending_is_noop() {
        let mut state = WorkflowState::new();
        assert!(!state.complete(ActionType::CreatePr, now()));
        assert!(state.completed_actions.is_empty());
    }

    #[test]
    fn test_readd_after_complete_is_allowed() {
        let mut state = WorkflowState::new();
        state.add_required(ActionType::CreatePr, now());
        state.complete(ActionType::CreatePr, now());
        assert!(state.add_required(ActionType::CreatePr, now()));
    }

    #[test]
    fn test_pending_with_mode_filters_by_policy() {
        let mut state = WorkflowState::new();
        state
            .enforcement_policies
            .insert(ActionType::CreatePr, EnforcementMode::Auto);
        state.add_required(ActionType::CreatePr, now());
        state.add_required(ActionType::SyncBoardStatus, now());

        let auto = state.pending_with_mode(EnforcementMode::Auto);
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].action_type, ActionType::CreatePr);

        let suggest = state.pending_with_mode(EnforcementMode::Suggest);
        assert_eq!(suggest.len(), 1);
        assert_eq!(suggest[0].action_type, ActionType::SyncBoardStatus);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = WorkflowState::new();
        state.current_issue = Some(42);
        state.phase = Phase::UnderReview;
        state.add_required(ActionType::CreatePr, now());

        state.reset();
        assert!(state.current_issue.is_none());
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.required_actions.is_empty());
        assert_eq!(state.mode_for(ActionType::CreatePr), EnforcementMode::Suggest);
    }

    #[test]
    fn test_action_type_parse_accepts_both_separators() {
        assert_eq!(ActionType::parse("create_pr"), Some(ActionType::CreatePr));
        assert_eq!(ActionType::parse("create-pr"), Some(ActionType::CreatePr));
        assert_eq!(
            ActionType::parse("SYNC-BOARD-STATUS"),
            Some(ActionType::SyncBoardStatus)
        );
        assert_eq!(ActionType::parse("merge_pr"), None);
    }

    #[test]
    fn test_enforcement_mode_parse() {
        assert_eq!(EnforcementMode::parse("auto"), Some(EnforcementMode::Auto));
        assert_eq!(EnforcementMode::parse("Warn"), Some(EnforcementMode::Warn));
        assert_eq!(EnforcementMode::parse("manual"), None);
    }

    #[test]
    fn test_set_policy_changes_effective_mode() {
        let mut state = WorkflowState::new();
        state.set_policy(ActionType::CreatePr, EnforcementMode::Auto);
        assert_eq!(state.mode_for(ActionType::CreatePr), EnforcementMode::Auto);
    }

    #[test]
    fn test_record_failure_keeps_action_pending() {
        let mut state = WorkflowState::new();
        state.add_required(ActionType::CreatePr, now());
        state.record_failure(ActionType::CreatePr, "remote rejected push");

        assert_eq!(state.required_actions.len(), 1);
        assert_eq!(state.required_actions[0].status, ActionStatus::Pending);
        assert_eq!(
            state.required_actions[0].failure_reason.as_deref(),
            Some("remote rejected push")
        );
    }
}
