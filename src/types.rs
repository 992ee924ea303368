//! Core types for nudge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Local repository state, recomputed for every resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryState {
    /// Currently checked-out branch name
    pub branch: String,
    /// Default branch of the repository (e.g., "main")
    pub default_branch: String,
    /// Whether the working tree has no uncommitted or untracked changes
    pub is_clean: bool,
    /// Uncommitted/untracked paths (empty when clean)
    pub dirty_paths: Vec<String>,
    /// Commits on the current branch not on the default branch
    pub ahead: usize,
    /// Commits on the default branch not on the current branch
    pub behind: usize,
    /// Whether the current branch's commits are already contained in the
    /// default branch (branch was merged)
    pub merged_into_default: bool,
}

impl RepositoryState {
    /// Whether we are sitting on the default branch itself
    pub fn on_default_branch(&self) -> bool {
        self.branch == self.default_branch
    }
}

/// Lifecycle state of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Queued but not started
    Queued,
    /// Currently running
    InProgress,
    /// Finished (see conclusion)
    Completed,
}

/// Conclusion of a completed check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// Passed
    Success,
    /// Failed
    Failure,
    /// Neutral (counts as passing)
    Neutral,
    /// Cancelled before finishing
    Cancelled,
    /// Timed out
    TimedOut,
    /// Skipped (counts as passing)
    Skipped,
    /// Requires manual action
    ActionRequired,
    /// Marked stale by the host
    Stale,
}

impl CheckConclusion {
    /// Conclusions that do not block a merge
    pub const fn is_passing(self) -> bool {
        matches!(self, Self::Success | Self::Neutral | Self::Skipped)
    }
}

/// A single check run attached to a PR's head commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    /// Check run name (e.g., "build", "clippy")
    pub name: String,
    /// Lifecycle state
    pub state: CheckState,
    /// Conclusion, present once completed
    pub conclusion: Option<CheckConclusion>,
}

impl CheckRun {
    /// Whether this run completed with a non-passing conclusion
    pub fn is_failed(&self) -> bool {
        self.state == CheckState::Completed
            && !self.conclusion.is_some_and(CheckConclusion::is_passing)
    }
}

/// Check runs aggregated per PR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckSummary {
    /// All check runs for the head commit (kept so failing checks can be
    /// named in output)
    pub runs: Vec<CheckRun>,
}

impl CheckSummary {
    /// Total number of check runs
    pub fn total(&self) -> usize {
        self.runs.len()
    }

    /// Completed runs with a passing conclusion
    pub fn passed(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.conclusion.is_some_and(CheckConclusion::is_passing))
            .count()
    }

    /// Completed runs with a non-passing conclusion
    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|r| r.is_failed()).count()
    }

    /// Runs still queued or in progress
    pub fn pending(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.state != CheckState::Completed)
            .count()
    }

    /// Names of runs that completed without a passing conclusion
    pub fn failed_names(&self) -> Vec<String> {
        self.runs
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.name.clone())
            .collect()
    }
}

/// Overall CI verdict for a PR's head commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiStatus {
    /// Every run completed with success/neutral/skipped
    Success,
    /// At least one run completed with a non-passing conclusion
    Failure,
    /// Runs exist but some have not completed
    Pending,
    /// Check data could not be retrieved; never treated as success
    Unknown,
}

/// Latest review verdict from a single reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    /// Approved the PR
    Approved,
    /// Requested changes
    ChangesRequested,
    /// Commented without a verdict
    Commented,
}

/// The latest review from one reviewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Reviewer login
    pub reviewer: String,
    /// Latest verdict from this reviewer
    pub verdict: ReviewVerdict,
    /// When the review was submitted
    pub submitted_at: DateTime<Utc>,
}

/// Reviews and comment threads aggregated per PR
///
/// Invariant: `latest` holds at most one record per reviewer - only the most
/// recent review per reviewer counts toward the PR's aggregate status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Latest review per reviewer
    pub latest: Vec<ReviewRecord>,
    /// Total comment threads
    pub threads_total: usize,
    /// Resolved comment threads
    pub threads_resolved: usize,
}

impl ReviewSummary {
    /// Whether at least one reviewer's latest verdict is approval
    pub fn has_approvals(&self) -> bool {
        self.latest
            .iter()
            .any(|r| r.verdict == ReviewVerdict::Approved)
    }

    /// Whether any reviewer's latest verdict requests changes
    pub fn has_changes_requested(&self) -> bool {
        self.latest
            .iter()
            .any(|r| r.verdict == ReviewVerdict::ChangesRequested)
    }

    /// Comment threads not yet resolved
    pub fn unresolved_threads(&self) -> usize {
        self.threads_total.saturating_sub(self.threads_resolved)
    }

    /// Most recent review submitted by the given login, if any
    pub fn latest_by(&self, login: &str) -> Option<&ReviewRecord> {
        self.latest.iter().find(|r| r.reviewer == login)
    }
}

/// Host-reported mergeable state of a PR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    /// Clean - can be merged
    Clean,
    /// Behind the base branch
    Behind,
    /// Working state is dirty
    Dirty,
    /// Blocked by branch protection
    Blocked,
    /// Has merge conflicts
    Conflicting,
    /// Host has not (or could not) compute the state
    Unknown,
}

impl std::fmt::Display for MergeableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Clean => "clean",
            Self::Behind => "behind",
            Self::Dirty => "dirty",
            Self::Blocked => "blocked",
            Self::Conflicting => "conflicting",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Everything known about one open PR after aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFacts {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Author login
    pub author: String,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// Whether the PR is a draft
    pub is_draft: bool,
    /// Last update timestamp (used by the re-review heuristic)
    pub updated_at: DateTime<Utc>,
    /// Host-reported mergeable flag (None = still computing)
    pub mergeable: Option<bool>,
    /// Host-reported mergeable state
    pub mergeable_state: MergeableState,
    /// Check runs; None when the checks provider was unavailable
    pub checks: Option<CheckSummary>,
    /// Reviews and threads; None when the reviews provider was unavailable
    pub reviews: Option<ReviewSummary>,
    /// Web URL
    pub html_url: String,
}

impl PrFacts {
    /// Whether the given login authored this PR
    pub fn authored_by(&self, login: &str) -> bool {
        self.author == login
    }
}

/// Derived merge-readiness verdict - computed, never stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReadiness {
    /// Overall CI verdict
    pub ci_status: CiStatus,
    /// Host-reported mergeable flag, resolved to a definite answer
    pub mergeable: bool,
    /// Host-reported mergeable state
    pub mergeable_state: MergeableState,
    /// Whether at least one latest review approves
    pub has_approvals: bool,
    /// Whether unresolved comment threads remain
    pub has_unresolved_comments: bool,
    /// Every obstacle found, accumulated rather than short-circuited
    pub blocking_reasons: Vec<String>,
    /// True iff all five conjuncts hold
    pub is_merge_ready: bool,
}

/// Project-board status field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardStatus {
    /// Ready to be picked up
    Todo,
    /// Being worked
    InProgress,
    /// Finished
    Done,
    /// Any other status column
    Other(String),
}

impl BoardStatus {
    /// Parse a board status field value ("To Do", "In Progress", ...)
    pub fn parse(value: &str) -> Self {
        match value
            .to_ascii_lowercase()
            .replace([' ', '-', '_'], "")
            .as_str()
        {
            "todo" | "backlog" => Self::Todo,
            "inprogress" | "doing" => Self::InProgress,
            "done" | "closed" => Self::Done,
            _ => Self::Other(value.to_string()),
        }
    }
}

/// An issue or Epic from the project board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItem {
    /// Issue number
    pub number: u64,
    /// Title
    pub title: String,
    /// Body text (may contain checklist lines)
    pub body: String,
    /// Whether the issue is open
    pub is_open: bool,
    /// Labels (an epic label distinguishes Epics)
    pub labels: Vec<String>,
    /// Assignee logins
    pub assignees: Vec<String>,
    /// Project-board status field value, if the item is on the board
    pub board_status: Option<BoardStatus>,
    /// Linked sub-issues (Epics only; empty otherwise)
    pub sub_issues: Vec<ProjectItem>,
}

impl ProjectItem {
    /// Whether this item carries the configured epic label
    pub fn is_epic(&self, epic_label: &str) -> bool {
        self.labels.iter().any(|l| l == epic_label)
    }

    /// Open sub-issues of this Epic
    pub fn open_sub_issues(&self) -> Vec<&ProjectItem> {
        self.sub_issues.iter().filter(|s| s.is_open).collect()
    }

    /// Whether the given login is assigned
    pub fn assigned_to(&self, login: &str) -> bool {
        self.assignees.iter().any(|a| a == login)
    }
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Act now, everything else waits
    Urgent,
    /// Act before starting anything new
    High,
    /// Normal flow of work
    Medium,
    /// Nothing required of the actor right now
    Low,
}

/// Recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Must happen before anything else
    Immediate,
    /// The natural next step in the flow
    NextLogical,
    /// Nice to do, nothing depends on it
    Optional,
}

/// The single recommended next action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextAction {
    /// What to do
    #[serde(flatten)]
    pub kind: ActionKind,
    /// How urgent it is
    pub priority: Priority,
    /// Where it sits in the flow
    pub category: Category,
}

/// The action itself - one variant per action kind, each carrying only the
/// fields relevant to that kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    /// CI is failing on an open PR; fix it before anything else
    FixCiFailures {
        /// PR with failing checks
        pr_number: u64,
        /// PR title
        pr_title: String,
        /// Names of the failed checks
        failed_checks: Vec<String>,
    },
    /// A PR of the actor's has feedback to address
    AddressPrFeedback {
        /// PR number
        pr_number: u64,
        /// PR title
        pr_title: String,
        /// Whether a reviewer formally requested changes
        changes_requested: bool,
        /// Unresolved comment threads
        unresolved_threads: usize,
    },
    /// A PR of the actor's is waiting for its first review
    WaitForReview {
        /// PR number
        pr_number: u64,
        /// PR title
        pr_title: String,
    },
    /// An approved PR of the actor's is ready to merge
    MergePr {
        /// PR number
        pr_number: u64,
        /// PR title
        pr_title: String,
    },
    /// An approved PR of the actor's is blocked from merging
    MergeBlocked {
        /// PR number
        pr_number: u64,
        /// PR title
        pr_title: String,
        /// Every blocking reason, not just the first
        blocking_reasons: Vec<String>,
    },
    /// Someone else's PR needs the actor's review
    ReviewPr {
        /// PR number
        pr_number: u64,
        /// PR title
        pr_title: String,
        /// PR author
        author: String,
    },
    /// Select what to work on (board, branch switch, or clear open PRs first)
    SelectWork {
        /// What to do and why
        instruction: String,
        /// Uncommitted paths that must be handled first, if any
        uncommitted_paths: Vec<String>,
    },
    /// All sub-issues of an in-progress Epic are closed; close out the Epic
    CompleteEpic {
        /// Epic number
        epic_number: u64,
        /// Epic title
        epic_title: String,
    },
    /// Analyze the single remaining sub-issue of an in-progress Epic
    EpicAnalysis {
        /// Epic number
        epic_number: u64,
        /// The sub-issue to analyze
        issue_number: u64,
        /// Sub-issue title
        issue_title: String,
    },
    /// Start the single eligible unassigned issue
    StartNewWork {
        /// Issue number
        issue_number: u64,
        /// Issue title
        issue_title: String,
    },
    /// Work the next unchecked checklist item of the in-progress issue
    WorkOnTodo {
        /// Issue number
        issue_number: u64,
        /// Text of the unchecked item
        todo_text: String,
        /// Source-order index of the item
        todo_index: usize,
        /// Total checklist items in the issue body
        total_todos: usize,
        /// Checklist items already checked
        completed_todos: usize,
    },
    /// Every checklist item is checked; move the issue toward a PR
    TodosComplete {
        /// Issue number
        issue_number: u64,
        /// Whether a PR already exists for the work branch
        pr_exists: bool,
        /// "create a PR" or "check PR status"
        instruction: String,
    },
}

/// One selectable choice of a pending decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionChoice {
    /// Stable choice id ("issue-<n>")
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Extra display metadata (labels, board status, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// What kind of selection is being deferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Pick one open sub-issue of an in-progress Epic
    EpicSubIssue,
    /// Pick one unassigned "to do" issue to start
    NewWork,
}

/// Structural context included with a decision so the chooser can see where
/// the repository currently stands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Currently checked-out branch
    pub current_branch: String,
    /// Open PR for that branch, if one exists
    pub existing_pr: Option<u64>,
}

/// A deferred decision - emitted when the cascade cannot pick a unique winner
///
/// Stateless: nothing is persisted at creation time. Resumption re-derives
/// everything from the selected choice id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDecision {
    /// Unique, time-derived id ("decision-<unix-millis>")
    pub decision_id: String,
    /// What is being decided
    pub kind: DecisionKind,
    /// The enumerated choices
    pub choices: Vec<DecisionChoice>,
    /// Natural-language prompt for the chooser
    pub prompt: String,
    /// Structural context at creation time
    pub context: DecisionContext,
}

/// Request for missing configuration - short-circuits the whole cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRequest {
    /// Names of the missing fields
    pub missing: Vec<String>,
}

/// The mutually-exclusive outcome of one resolution call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Resolution {
    /// A single concrete next action
    Action(NextAction),
    /// A deferred decision with enumerated choices
    Decision(PendingDecision),
    /// Required configuration is absent
    ConfigRequired(ConfigRequest),
}

/// Full response of a resolution: the outcome plus the three parallel
/// advisory lists, so callers get a usable result even on partial failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// The single outcome
    pub resolution: Resolution,
    /// Automatic actions already taken during this resolution
    pub automatic_actions: Vec<String>,
    /// Problems found along the way (degraded providers, oddities)
    pub issues_found: Vec<String>,
    /// Advisory next steps that did not win the cascade
    pub suggestions: Vec<String>,
}

/// Effects applied by resuming a decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedDecision {
    /// The issue that was selected
    pub issue_number: u64,
    /// Issue title
    pub issue_title: String,
    /// Whether the issue was assigned to the actor (false if already assigned)
    pub assigned: bool,
    /// Whether the board status was moved to "in progress"
    pub status_updated: bool,
    /// The branch created or switched to
    pub branch: String,
}
