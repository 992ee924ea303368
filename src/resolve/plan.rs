//! Priority cascade - pure decision logic
//!
//! No I/O happens here. The cascade takes a gathered snapshot plus the
//! persisted workflow state and returns exactly one outcome: a concrete next
//! action, a deferred decision, or an enforcement plan for the shell to
//! execute. Rules are strictly ordered and the first match is terminal.

use chrono::{DateTime, Utc};

use crate::checklist::parse_checklist;
use crate::decision::{choice_for_item, new_decision_id};
use crate::readiness::{ci_status, evaluate_readiness};
use crate::snapshot::WorkflowSnapshot;
use crate::state::{ActionType, EnforcementMode, WorkflowState};
use crate::types::{
    ActionKind, BoardStatus, Category, CiStatus, DecisionContext, DecisionKind, NextAction,
    PendingDecision, PrFacts, Priority, ProjectItem,
};

/// One planned enforcement operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcementOp {
    /// Create a PR for the work branch
    CreatePr {
        /// Head branch
        head: String,
        /// Base branch
        base: String,
        /// PR title
        title: String,
        /// PR body
        body: Option<String>,
    },
    /// Move an issue's board status
    SetBoardStatus {
        /// Issue number
        issue_number: u64,
        /// Target status
        status: BoardStatus,
    },
    /// The required condition already holds; nothing to mutate
    AlreadySatisfied {
        /// Why no mutation is needed
        note: String,
    },
}

/// One step of an enforcement plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementStep {
    /// The required action being enforced
    pub action_type: ActionType,
    /// What to do about it
    pub op: EnforcementOp,
}

/// A plan of auto-mode enforcement steps, executed by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementPlan {
    /// Steps in execution order
    pub steps: Vec<EnforcementStep>,
}

/// The single outcome of one cascade evaluation
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A concrete next action
    Action(NextAction),
    /// A deferred decision with enumerated choices
    Decision(PendingDecision),
    /// Auto-mode required actions to apply before deciding again
    Enforce(EnforcementPlan),
}

fn action(kind: ActionKind, priority: Priority, category: Category) -> Outcome {
    Outcome::Action(NextAction {
        kind,
        priority,
        category,
    })
}

/// Evaluate the cascade (PURE).
///
/// `allow_enforce` is false once enforcement has already run in this
/// resolution (or under `--dry-run`), so rule 2 cannot fire twice.
pub fn decide(
    snapshot: &WorkflowSnapshot,
    state: &WorkflowState,
    now: DateTime<Utc>,
    allow_enforce: bool,
) -> Outcome {
    // Rule 1: failing CI anywhere outranks everything.
    // Canonical order is ascending PR number, so the tie-break is the lowest.
    let mut by_number: Vec<&PrFacts> = snapshot.prs.iter().collect();
    by_number.sort_by_key(|pr| pr.number);
    for pr in &by_number {
        if ci_status(pr.checks.as_ref()) == CiStatus::Failure {
            let failed_checks = pr
                .checks
                .as_ref()
                .map(|c| c.failed_names())
                .unwrap_or_default();
            return action(
                ActionKind::FixCiFailures {
                    pr_number: pr.number,
                    pr_title: pr.title.clone(),
                    failed_checks,
                },
                Priority::Urgent,
                Category::Immediate,
            );
        }
    }

    // Rule 2: pending auto-mode required actions become an enforcement plan
    if allow_enforce {
        let pending = state.pending_with_mode(EnforcementMode::Auto);
        if !pending.is_empty() {
            let steps = pending
                .iter()
                .map(|a| plan_enforcement(snapshot, state, a.action_type))
                .collect();
            return Outcome::Enforce(EnforcementPlan { steps });
        }
    }

    // Rule 3: the current branch is already merged into the default branch
    if snapshot.repo.merged_into_default {
        return action(
            ActionKind::SelectWork {
                instruction: format!(
                    "branch '{}' is merged into '{}'; switch back and pick the next task",
                    snapshot.repo.branch, snapshot.repo.default_branch
                ),
                uncommitted_paths: snapshot.repo.dirty_paths.clone(),
            },
            Priority::High,
            Category::Immediate,
        );
    }

    // Already in ascending-number order
    let own: Vec<&PrFacts> = by_number
        .iter()
        .copied()
        .filter(|pr| pr.authored_by(&snapshot.actor))
        .collect();

    // Rule 4: feedback on an own PR. A formal changes-requested verdict
    // outranks comment-only threads.
    let feedback = own
        .iter()
        .find(|pr| {
            pr.reviews
                .as_ref()
                .is_some_and(|r| r.has_changes_requested())
        })
        .or_else(|| {
            own.iter().find(|pr| {
                pr.reviews
                    .as_ref()
                    .is_some_and(|r| r.unresolved_threads() > 0)
            })
        });
    if let Some(pr) = feedback {
        let reviews = pr.reviews.as_ref();
        return action(
            ActionKind::AddressPrFeedback {
                pr_number: pr.number,
                pr_title: pr.title.clone(),
                changes_requested: reviews.is_some_and(|r| r.has_changes_requested()),
                unresolved_threads: reviews.map_or(0, |r| r.unresolved_threads()),
            },
            Priority::High,
            Category::Immediate,
        );
    }

    // Rule 5: an own non-draft PR with no review activity yet
    if let Some(pr) = own.iter().find(|pr| {
        !pr.is_draft
            && pr
                .reviews
                .as_ref()
                .is_some_and(|r| r.latest.is_empty() && r.threads_total == 0)
    }) {
        return action(
            ActionKind::WaitForReview {
                pr_number: pr.number,
                pr_title: pr.title.clone(),
            },
            Priority::Low,
            Category::NextLogical,
        );
    }

    // Rule 6: an approved own PR - merge it, or name everything in the way
    if let Some(pr) = own
        .iter()
        .find(|pr| pr.reviews.as_ref().is_some_and(|r| r.has_approvals()))
    {
        let readiness = evaluate_readiness(pr);
        if readiness.is_merge_ready {
            return action(
                ActionKind::MergePr {
                    pr_number: pr.number,
                    pr_title: pr.title.clone(),
                },
                Priority::High,
                Category::NextLogical,
            );
        }
        return action(
            ActionKind::MergeBlocked {
                pr_number: pr.number,
                pr_title: pr.title.clone(),
                blocking_reasons: readiness.blocking_reasons,
            },
            Priority::High,
            Category::Immediate,
        );
    }

    // Rule 7: someone else's PR waiting on the actor - never reviewed, or
    // updated since the actor's last review
    if let Some(pr) = by_number.iter().find(|pr| {
        !pr.authored_by(&snapshot.actor)
            && !pr.is_draft
            && pr.reviews.as_ref().is_some_and(|r| {
                r.latest_by(&snapshot.actor)
                    .is_none_or(|review| review.submitted_at < pr.updated_at)
            })
    }) {
        return action(
            ActionKind::ReviewPr {
                pr_number: pr.number,
                pr_title: pr.title.clone(),
                author: pr.author.clone(),
            },
            Priority::Medium,
            Category::NextLogical,
        );
    }

    // Rule 8: open PRs remain (own with unknown review data, or already
    // reviewed) - resolve them before anything new starts
    if !snapshot.prs.is_empty() {
        return action(
            ActionKind::SelectWork {
                instruction: "resolve open PRs before starting new work".to_string(),
                uncommitted_paths: Vec::new(),
            },
            Priority::High,
            Category::Immediate,
        );
    }

    // Rule 9: an in-progress Epic drives sub-issue selection
    if let Some(epic) = snapshot.epics.iter().min_by_key(|e| e.number) {
        return decide_epic(snapshot, epic, now);
    }

    // Rule 10 when nothing is in progress; rule 11 drives the in-progress
    // issue's checklist otherwise
    match snapshot.issues.iter().min_by_key(|i| i.number) {
        None => decide_new_work(snapshot, now),
        Some(issue) => decide_checklist(snapshot, issue),
    }
}

fn decide_epic(snapshot: &WorkflowSnapshot, epic: &ProjectItem, now: DateTime<Utc>) -> Outcome {
    let open_subs = epic.open_sub_issues();
    match open_subs.as_slice() {
        [] => action(
            ActionKind::CompleteEpic {
                epic_number: epic.number,
                epic_title: epic.title.clone(),
            },
            Priority::Medium,
            Category::NextLogical,
        ),
        [only] => action(
            ActionKind::EpicAnalysis {
                epic_number: epic.number,
                issue_number: only.number,
                issue_title: only.title.clone(),
            },
            Priority::Medium,
            Category::NextLogical,
        ),
        many => Outcome::Decision(PendingDecision {
            decision_id: new_decision_id(now),
            kind: DecisionKind::EpicSubIssue,
            choices: many.iter().map(|i| choice_for_item(i)).collect(),
            prompt: format!(
                "Epic #{} '{}' has {} open sub-issues; pick one to work next",
                epic.number,
                epic.title,
                many.len()
            ),
            context: decision_context(snapshot),
        }),
    }
}

fn decide_new_work(snapshot: &WorkflowSnapshot, now: DateTime<Utc>) -> Outcome {
    match snapshot.todo_candidates.as_slice() {
        [] => action(
            ActionKind::SelectWork {
                instruction: "nothing in progress and no unassigned work; review the board"
                    .to_string(),
                uncommitted_paths: Vec::new(),
            },
            Priority::Low,
            Category::Optional,
        ),
        [only] => action(
            ActionKind::StartNewWork {
                issue_number: only.number,
                issue_title: only.title.clone(),
            },
            Priority::Medium,
            Category::NextLogical,
        ),
        many => Outcome::Decision(PendingDecision {
            decision_id: new_decision_id(now),
            kind: DecisionKind::NewWork,
            choices: many.iter().map(choice_for_item).collect(),
            prompt: format!("{} unassigned items are ready to start; pick one", many.len()),
            context: decision_context(snapshot),
        }),
    }
}

fn decide_checklist(snapshot: &WorkflowSnapshot, issue: &ProjectItem) -> Outcome {
    let checklist = parse_checklist(&issue.body);
    if let Some(item) = checklist.first_unchecked() {
        return action(
            ActionKind::WorkOnTodo {
                issue_number: issue.number,
                todo_text: item.text.clone(),
                todo_index: item.index,
                total_todos: checklist.total(),
                completed_todos: checklist.completed(),
            },
            Priority::Medium,
            Category::NextLogical,
        );
    }

    let pr_exists = snapshot.pr_for_branch(&snapshot.repo.branch).is_some();
    let instruction = if pr_exists {
        format!("all todos done; check the status of the PR for '{}'", snapshot.repo.branch)
    } else {
        format!("all todos done; create a PR for '{}'", snapshot.repo.branch)
    };
    action(
        ActionKind::TodosComplete {
            issue_number: issue.number,
            pr_exists,
            instruction,
        },
        Priority::Medium,
        Category::NextLogical,
    )
}

fn decision_context(snapshot: &WorkflowSnapshot) -> DecisionContext {
    DecisionContext {
        current_branch: snapshot.repo.branch.clone(),
        existing_pr: snapshot
            .pr_for_branch(&snapshot.repo.branch)
            .map(|pr| pr.number),
    }
}

/// Translate one pending auto-mode action into a concrete step given the
/// current facts. When the required condition already holds, the step is a
/// no-mutation completion.
fn plan_enforcement(
    snapshot: &WorkflowSnapshot,
    state: &WorkflowState,
    action_type: ActionType,
) -> EnforcementStep {
    let op = match action_type {
        ActionType::CreatePr => {
            let branch = &snapshot.repo.branch;
            if snapshot.pr_for_branch(branch).is_some() {
                EnforcementOp::AlreadySatisfied {
                    note: format!("a PR already exists for '{branch}'"),
                }
            } else if snapshot.repo.on_default_branch() || snapshot.repo.ahead == 0 {
                EnforcementOp::AlreadySatisfied {
                    note: format!("'{branch}' has no commits to submit"),
                }
            } else {
                EnforcementOp::CreatePr {
                    head: branch.clone(),
                    base: snapshot.repo.default_branch.clone(),
                    title: branch.clone(),
                    body: state.current_issue.map(|n| format!("Closes #{n}")),
                }
            }
        }
        ActionType::SyncBoardStatus => match state.current_issue {
            Some(issue_number) => EnforcementOp::SetBoardStatus {
                issue_number,
                status: BoardStatus::InProgress,
            },
            None => EnforcementOp::AlreadySatisfied {
                note: "no work item is active".to_string(),
            },
        },
    };
    EnforcementStep { action_type, op }
}
