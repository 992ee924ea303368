//! State aggregation
//!
//! One read-only pass over the providers producing the facts the resolver
//! consumes. Per-fact provider failures degrade to absent data plus an
//! advisory note; they never abort the resolution, and absent never means
//! favorable (a PR whose checks could not be fetched does not count as green).

use tracing::{debug, warn};

use crate::error::Result;
use crate::provider::{HostProvider, RepoProvider};
use crate::types::{BoardStatus, PrFacts, ProjectItem, RepositoryState};

/// Everything the resolver needs to know, gathered in one pass
#[derive(Debug, Clone)]
pub struct WorkflowSnapshot {
    /// Local repository facts
    pub repo: RepositoryState,
    /// Login of the authenticated actor
    pub actor: String,
    /// Open PRs with check and review facts attached where they could be
    /// fetched
    pub prs: Vec<PrFacts>,
    /// The actor's in-progress Epics, sub-issues populated
    pub epics: Vec<ProjectItem>,
    /// The actor's in-progress plain issues
    pub issues: Vec<ProjectItem>,
    /// Unassigned board items still in "to do"
    pub todo_candidates: Vec<ProjectItem>,
    /// Advisory notes from degraded fact gathering
    pub notes: Vec<String>,
}

impl WorkflowSnapshot {
    /// PRs authored by the actor
    pub fn own_prs(&self) -> impl Iterator<Item = &PrFacts> {
        self.prs.iter().filter(|pr| pr.authored_by(&self.actor))
    }

    /// PRs authored by someone else
    pub fn others_prs(&self) -> impl Iterator<Item = &PrFacts> {
        self.prs.iter().filter(|pr| !pr.authored_by(&self.actor))
    }

    /// The actor's PR for a branch, if one exists
    pub fn pr_for_branch(&self, branch: &str) -> Option<&PrFacts> {
        self.prs.iter().find(|pr| pr.head_ref == branch)
    }
}

/// Gather a snapshot from the local repository and the code host.
///
/// Repository state and the actor identity are hard prerequisites; everything
/// else degrades per fact.
pub async fn build_snapshot(
    repo: &dyn RepoProvider,
    host: &dyn HostProvider,
    epic_label: &str,
) -> Result<WorkflowSnapshot> {
    let repo_state = repo.state()?;
    let actor = host.current_actor().await?;
    debug!(branch = %repo_state.branch, %actor, "gathering snapshot");

    let mut notes = Vec::new();

    let mut prs = match host.list_open_prs().await {
        Ok(prs) => prs,
        Err(e) => {
            warn!(error = %e, "failed to list open PRs");
            notes.push(format!("could not list open PRs: {e}"));
            Vec::new()
        }
    };

    for pr in &mut prs {
        match host.get_check_runs(&pr.head_ref).await {
            Ok(summary) => pr.checks = Some(summary),
            Err(e) => {
                warn!(pr = pr.number, error = %e, "failed to fetch check runs");
                notes.push(format!("checks unavailable for PR #{}: {e}", pr.number));
            }
        }
        match host.get_review_summary(pr.number).await {
            Ok(summary) => pr.reviews = Some(summary),
            Err(e) => {
                warn!(pr = pr.number, error = %e, "failed to fetch reviews");
                notes.push(format!("reviews unavailable for PR #{}: {e}", pr.number));
            }
        }
    }

    let board_items = match host.list_board_items().await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "failed to list board items");
            notes.push(format!("could not list board items: {e}"));
            Vec::new()
        }
    };

    let mut epics = Vec::new();
    let mut issues = Vec::new();
    let mut todo_candidates = Vec::new();
    for item in board_items {
        if !item.is_open {
            continue;
        }
        let in_progress = item.board_status == Some(BoardStatus::InProgress);
        if in_progress && item.assigned_to(&actor) {
            if item.is_epic(epic_label) {
                epics.push(item);
            } else {
                issues.push(item);
            }
        } else if item.board_status == Some(BoardStatus::Todo)
            && item.assignees.is_empty()
            && !item.is_epic(epic_label)
        {
            // Epics are containers, never direct work candidates
            todo_candidates.push(item);
        }
    }

    // Sub-issues per Epic. An Epic whose sub-issues cannot be fetched is
    // withheld from the resolver rather than treated as sub-issue-free.
    let mut resolved_epics = Vec::with_capacity(epics.len());
    for mut epic in epics {
        match host.list_sub_issues(epic.number).await {
            Ok(subs) => {
                epic.sub_issues = subs;
                resolved_epics.push(epic);
            }
            Err(e) => {
                warn!(epic = epic.number, error = %e, "failed to list sub-issues");
                notes.push(format!(
                    "sub-issues unavailable for Epic #{}; check it manually: {e}",
                    epic.number
                ));
            }
        }
    }

    debug!(
        prs = prs.len(),
        epics = resolved_epics.len(),
        issues = issues.len(),
        todo_candidates = todo_candidates.len(),
        notes = notes.len(),
        "snapshot complete"
    );

    Ok(WorkflowSnapshot {
        repo: repo_state,
        actor,
        prs,
        epics: resolved_epics,
        issues,
        todo_candidates,
        notes,
    })
}
