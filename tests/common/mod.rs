//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_provider;

use chrono::{DateTime, TimeZone, Utc};
use nudge::snapshot::WorkflowSnapshot;
use nudge::types::{
    CheckConclusion, CheckRun, CheckState, CheckSummary, MergeableState, PrFacts, ProjectItem,
    RepositoryState, ReviewRecord, ReviewSummary, ReviewVerdict,
};

/// A fixed timestamp so fixtures compare equal across calls
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// A clean working copy on the given branch
pub fn make_repo_state(branch: &str) -> RepositoryState {
    RepositoryState {
        branch: branch.to_string(),
        default_branch: "main".to_string(),
        is_clean: true,
        dirty_paths: Vec::new(),
        ahead: 0,
        behind: 0,
        merged_into_default: false,
    }
}

/// An open, reviewable, mergeable PR with no checks and no reviews yet
pub fn make_pr(number: u64, author: &str, head: &str) -> PrFacts {
    PrFacts {
        number,
        title: format!("PR {number}"),
        author: author.to_string(),
        head_ref: head.to_string(),
        base_ref: "main".to_string(),
        is_draft: false,
        updated_at: fixed_time(),
        mergeable: Some(true),
        mergeable_state: MergeableState::Clean,
        checks: Some(CheckSummary::default()),
        reviews: Some(ReviewSummary::default()),
        html_url: String::new(),
    }
}

/// A check run; completed when a conclusion is given, in progress otherwise
pub fn make_check(name: &str, conclusion: Option<CheckConclusion>) -> CheckRun {
    CheckRun {
        name: name.to_string(),
        state: if conclusion.is_some() {
            CheckState::Completed
        } else {
            CheckState::InProgress
        },
        conclusion,
    }
}

pub fn make_checks(runs: Vec<CheckRun>) -> CheckSummary {
    CheckSummary { runs }
}

pub fn make_review(reviewer: &str, verdict: ReviewVerdict) -> ReviewRecord {
    ReviewRecord {
        reviewer: reviewer.to_string(),
        verdict,
        submitted_at: fixed_time(),
    }
}

pub fn make_reviews(
    latest: Vec<ReviewRecord>,
    threads_total: usize,
    threads_resolved: usize,
) -> ReviewSummary {
    ReviewSummary {
        latest,
        threads_total,
        threads_resolved,
    }
}

/// An open issue with no labels, assignees, or board status
pub fn make_item(number: u64, title: &str) -> ProjectItem {
    ProjectItem {
        number,
        title: title.to_string(),
        body: String::new(),
        is_open: true,
        labels: Vec::new(),
        assignees: Vec::new(),
        board_status: None,
        sub_issues: Vec::new(),
    }
}

/// An empty snapshot: clean main, no PRs, nothing on the board
pub fn make_snapshot(actor: &str) -> WorkflowSnapshot {
    WorkflowSnapshot {
        repo: make_repo_state("main"),
        actor: actor.to_string(),
        prs: Vec::new(),
        epics: Vec::new(),
        issues: Vec::new(),
        todo_candidates: Vec::new(),
        notes: Vec::new(),
    }
}
