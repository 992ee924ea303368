//! Mock providers for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use nudge::error::{Error, Result};
use nudge::provider::{HostProvider, RepoProvider};
use nudge::types::{
    BoardStatus, CheckSummary, PrFacts, ProjectItem, RepositoryState, ReviewSummary,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Call record for `create_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: Option<String>,
}

/// Call record for `set_board_status`
#[derive(Debug, Clone, PartialEq)]
pub struct SetStatusCall {
    pub issue_number: u64,
    pub status: BoardStatus,
}

/// Call record for `assign_issue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignCall {
    pub issue_number: u64,
    pub login: String,
}

/// Simple mock host provider for testing
///
/// Manually implemented rather than generated, for full control over
/// response maps, call tracking, and error injection.
pub struct MockHostProvider {
    actor: String,
    next_pr_number: AtomicU64,
    // Response maps
    prs: Mutex<Vec<PrFacts>>,
    check_runs: Mutex<HashMap<String, CheckSummary>>,
    reviews: Mutex<HashMap<u64, ReviewSummary>>,
    board_items: Mutex<Vec<ProjectItem>>,
    issues: Mutex<HashMap<u64, ProjectItem>>,
    sub_issues: Mutex<HashMap<u64, Vec<ProjectItem>>>,
    // Call tracking
    get_issue_calls: Mutex<Vec<u64>>,
    assign_calls: Mutex<Vec<AssignCall>>,
    set_status_calls: Mutex<Vec<SetStatusCall>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    // Error injection
    error_on_list_prs: Mutex<Option<String>>,
    error_on_check_runs: Mutex<Option<String>>,
    error_on_reviews: Mutex<Option<String>>,
    error_on_board_items: Mutex<Option<String>>,
    error_on_get_issue: Mutex<Option<String>>,
    error_on_sub_issues: Mutex<Option<String>>,
    error_on_assign: Mutex<Option<String>>,
    error_on_set_status: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
}

impl MockHostProvider {
    /// Create a new mock authenticated as `actor`
    pub fn new(actor: &str) -> Self {
        Self {
            actor: actor.to_string(),
            next_pr_number: AtomicU64::new(100),
            prs: Mutex::new(Vec::new()),
            check_runs: Mutex::new(HashMap::new()),
            reviews: Mutex::new(HashMap::new()),
            board_items: Mutex::new(Vec::new()),
            issues: Mutex::new(HashMap::new()),
            sub_issues: Mutex::new(HashMap::new()),
            get_issue_calls: Mutex::new(Vec::new()),
            assign_calls: Mutex::new(Vec::new()),
            set_status_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            error_on_list_prs: Mutex::new(None),
            error_on_check_runs: Mutex::new(None),
            error_on_reviews: Mutex::new(None),
            error_on_board_items: Mutex::new(None),
            error_on_get_issue: Mutex::new(None),
            error_on_sub_issues: Mutex::new(None),
            error_on_assign: Mutex::new(None),
            error_on_set_status: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
        }
    }

    // === Response setup ===

    /// Add an open PR (checks/reviews are attached via the maps below)
    pub fn add_pr(&self, pr: PrFacts) {
        self.prs.lock().unwrap().push(pr);
    }

    /// Set the check runs returned for a head ref
    pub fn set_check_runs(&self, head_ref: &str, summary: CheckSummary) {
        self.check_runs
            .lock()
            .unwrap()
            .insert(head_ref.to_string(), summary);
    }

    /// Set the review summary returned for a PR
    pub fn set_reviews(&self, pr_number: u64, summary: ReviewSummary) {
        self.reviews.lock().unwrap().insert(pr_number, summary);
    }

    /// Add a board item; also registered for `get_issue`
    pub fn add_board_item(&self, item: ProjectItem) {
        self.issues
            .lock()
            .unwrap()
            .insert(item.number, item.clone());
        self.board_items.lock().unwrap().push(item);
    }

    /// Register an issue for `get_issue` without putting it on the board
    pub fn add_issue(&self, item: ProjectItem) {
        self.issues.lock().unwrap().insert(item.number, item);
    }

    /// Set the sub-issues returned for an Epic
    pub fn set_sub_issues(&self, epic_number: u64, subs: Vec<ProjectItem>) {
        self.sub_issues.lock().unwrap().insert(epic_number, subs);
    }

    // === Error injection ===

    pub fn fail_list_prs(&self, msg: &str) {
        *self.error_on_list_prs.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_check_runs(&self, msg: &str) {
        *self.error_on_check_runs.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_reviews(&self, msg: &str) {
        *self.error_on_reviews.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_board_items(&self, msg: &str) {
        *self.error_on_board_items.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_get_issue(&self, msg: &str) {
        *self.error_on_get_issue.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_sub_issues(&self, msg: &str) {
        *self.error_on_sub_issues.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_assign(&self, msg: &str) {
        *self.error_on_assign.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_set_status(&self, msg: &str) {
        *self.error_on_set_status.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification ===

    pub fn get_issue_calls(&self) -> Vec<u64> {
        self.get_issue_calls.lock().unwrap().clone()
    }

    pub fn assign_calls(&self) -> Vec<AssignCall> {
        self.assign_calls.lock().unwrap().clone()
    }

    pub fn set_status_calls(&self) -> Vec<SetStatusCall> {
        self.set_status_calls.lock().unwrap().clone()
    }

    pub fn create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostProvider for MockHostProvider {
    async fn current_actor(&self) -> Result<String> {
        Ok(self.actor.clone())
    }

    async fn list_open_prs(&self) -> Result<Vec<PrFacts>> {
        if let Some(msg) = self.error_on_list_prs.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        // Facts without check/review data, as the real provider returns them
        let stripped = self
            .prs
            .lock()
            .unwrap()
            .iter()
            .map(|pr| PrFacts {
                checks: None,
                reviews: None,
                ..pr.clone()
            })
            .collect();
        Ok(stripped)
    }

    async fn get_check_runs(&self, head_ref: &str) -> Result<CheckSummary> {
        if let Some(msg) = self.error_on_check_runs.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        Ok(self
            .check_runs
            .lock()
            .unwrap()
            .get(head_ref)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_review_summary(&self, pr_number: u64) -> Result<ReviewSummary> {
        if let Some(msg) = self.error_on_reviews.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_board_items(&self) -> Result<Vec<ProjectItem>> {
        if let Some(msg) = self.error_on_board_items.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        Ok(self.board_items.lock().unwrap().clone())
    }

    async fn get_issue(&self, number: u64) -> Result<ProjectItem> {
        self.get_issue_calls.lock().unwrap().push(number);
        if let Some(msg) = self.error_on_get_issue.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        self.issues
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("issue #{number} not found")))
    }

    async fn list_sub_issues(&self, epic_number: u64) -> Result<Vec<ProjectItem>> {
        if let Some(msg) = self.error_on_sub_issues.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        Ok(self
            .sub_issues
            .lock()
            .unwrap()
            .get(&epic_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_issue(&self, number: u64, login: &str) -> Result<()> {
        if let Some(msg) = self.error_on_assign.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        self.assign_calls.lock().unwrap().push(AssignCall {
            issue_number: number,
            login: login.to_string(),
        });
        Ok(())
    }

    async fn set_board_status(&self, number: u64, status: BoardStatus) -> Result<()> {
        if let Some(msg) = self.error_on_set_status.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        self.set_status_calls.lock().unwrap().push(SetStatusCall {
            issue_number: number,
            status,
        });
        Ok(())
    }

    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<u64> {
        if let Some(msg) = self.error_on_create_pr.lock().unwrap().clone() {
            return Err(Error::Provider(msg));
        }
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.map(ToString::to_string),
        });
        Ok(self.next_pr_number.fetch_add(1, Ordering::SeqCst))
    }
}

/// Mock repository provider returning a fixed state
pub struct MockRepoProvider {
    state: Mutex<RepositoryState>,
    prepare_calls: Mutex<Vec<String>>,
    error_on_prepare: Mutex<Option<String>>,
}

impl MockRepoProvider {
    pub fn new(state: RepositoryState) -> Self {
        Self {
            state: Mutex::new(state),
            prepare_calls: Mutex::new(Vec::new()),
            error_on_prepare: Mutex::new(None),
        }
    }

    pub fn set_state(&self, state: RepositoryState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn fail_prepare(&self, msg: &str) {
        *self.error_on_prepare.lock().unwrap() = Some(msg.to_string());
    }

    pub fn prepare_calls(&self) -> Vec<String> {
        self.prepare_calls.lock().unwrap().clone()
    }
}

impl RepoProvider for MockRepoProvider {
    fn state(&self) -> Result<RepositoryState> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn prepare_branch(&self, name: &str) -> Result<()> {
        if let Some(msg) = self.error_on_prepare.lock().unwrap().clone() {
            return Err(Error::Git(msg));
        }
        self.prepare_calls.lock().unwrap().push(name.to_string());
        Ok(())
    }
}
