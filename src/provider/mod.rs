//! Data providers - the seams to the outside world
//!
//! The decision core consumes read-only facts through these traits and never
//! talks to git or the code host directly. Mutations exist only for the two
//! places allowed to write: auto-enforcement and decision resumption.

pub mod git;
pub mod github;

pub use git::GitRepo;
pub use github::GitHubHost;

use crate::error::Result;
use crate::types::{BoardStatus, CheckSummary, PrFacts, ProjectItem, RepositoryState, ReviewSummary};
use async_trait::async_trait;

/// Read access to the local repository working copy
pub trait RepoProvider: Send + Sync {
    /// Compute the current repository state (branch, cleanliness,
    /// ahead/behind vs the default branch)
    fn state(&self) -> Result<RepositoryState>;

    /// Create the named branch off the default branch, or switch to it if it
    /// already exists. Used only by decision resumption.
    fn prepare_branch(&self, name: &str) -> Result<()>;
}

/// Read access to the code host plus the few mutations the core may apply
#[async_trait]
pub trait HostProvider: Send + Sync {
    /// Login of the authenticated actor
    async fn current_actor(&self) -> Result<String>;

    /// All open PRs, without check/review data attached
    /// (the aggregator fetches those per PR so failures degrade per fact)
    async fn list_open_prs(&self) -> Result<Vec<PrFacts>>;

    /// Check runs for a PR's head commit
    async fn get_check_runs(&self, head_ref: &str) -> Result<CheckSummary>;

    /// Latest-review-per-reviewer aggregate and comment-thread counts
    async fn get_review_summary(&self, pr_number: u64) -> Result<ReviewSummary>;

    /// Project-board items (issues and Epics) with status field values
    async fn list_board_items(&self) -> Result<Vec<ProjectItem>>;

    /// A single issue by number
    async fn get_issue(&self, number: u64) -> Result<ProjectItem>;

    /// Open and closed sub-issues linked under an Epic
    async fn list_sub_issues(&self, epic_number: u64) -> Result<Vec<ProjectItem>>;

    /// Assign an issue to a login (resumption only)
    async fn assign_issue(&self, number: u64, login: &str) -> Result<()>;

    /// Move an issue's board status (resumption only)
    async fn set_board_status(&self, number: u64, status: BoardStatus) -> Result<()>;

    /// Create a PR (auto-enforcement only). Returns the new PR number.
    async fn create_pr(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<u64>;
}
