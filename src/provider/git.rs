//! Local repository provider backed by git2

use std::path::{Path, PathBuf};

use git2::{BranchType, Repository, StatusOptions};
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::RepoProvider;
use crate::types::RepositoryState;

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
fn validate_branch_name(name: &str) -> Result<()> {
    if name.starts_with('-') {
        return Err(Error::Git(format!(
            "invalid branch name (starts with '-'): {name}"
        )));
    }
    Ok(())
}

/// Working-copy facts read through libgit2
pub struct GitRepo {
    root: PathBuf,
    default_branch: String,
}

impl GitRepo {
    /// Open the repository at (or above) the given path
    pub fn open(path: &Path, default_branch: &str) -> Result<Self> {
        // Open eagerly so a missing repository fails at construction
        let repo = Repository::discover(path)?;
        let root = repo
            .workdir()
            .ok_or_else(|| Error::Git("repository has no working tree".to_string()))?
            .to_path_buf();

        Ok(Self {
            root,
            default_branch: default_branch.to_string(),
        })
    }

    /// Working-copy root (where the state record lives)
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repo(&self) -> Result<Repository> {
        Ok(Repository::open(&self.root)?)
    }
}

impl RepoProvider for GitRepo {
    fn state(&self) -> Result<RepositoryState> {
        let repo = self.repo()?;

        let head = repo.head()?;
        let branch = head
            .shorthand()
            .unwrap_or("(detached)")
            .to_string();

        let mut status_opts = StatusOptions::new();
        status_opts.include_untracked(true).exclude_submodules(true);
        let statuses = repo.statuses(Some(&mut status_opts))?;
        let dirty_paths: Vec<String> = statuses
            .iter()
            .filter_map(|s| s.path().map(ToString::to_string))
            .collect();
        let is_clean = dirty_paths.is_empty();

        // Ahead/behind vs the default branch; a missing default branch ref
        // (fresh clone, unusual setup) degrades to zero counts
        let (ahead, behind, merged_into_default) = match default_branch_oid(&repo, &self.default_branch) {
            Some(default_oid) => {
                let head_oid = head
                    .target()
                    .ok_or_else(|| Error::Git("HEAD is not a direct reference".to_string()))?;
                let (a, b) = repo.graph_ahead_behind(head_oid, default_oid)?;
                // Strict ancestor: a fresh branch whose tip still equals the
                // default tip is new work, not a merged branch
                let merged = branch != self.default_branch && a == 0 && b > 0;
                (a, b, merged)
            }
            None => (0, 0, false),
        };

        debug!(
            branch,
            is_clean, ahead, behind, merged_into_default, "read repository state"
        );

        Ok(RepositoryState {
            branch,
            default_branch: self.default_branch.clone(),
            is_clean,
            dirty_paths,
            ahead,
            behind,
            merged_into_default,
        })
    }

    fn prepare_branch(&self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        let repo = self.repo()?;

        if repo.find_branch(name, BranchType::Local).is_err() {
            // Branch off the default branch tip; fall back to HEAD when the
            // default branch has no local ref
            let base = match default_branch_oid(&repo, &self.default_branch) {
                Some(oid) => repo.find_commit(oid)?,
                None => repo.head()?.peel_to_commit()?,
            };
            repo.branch(name, &base, false)?;
            debug!(branch = name, "created branch");
        }

        let obj = repo.revparse_single(&format!("refs/heads/{name}"))?;
        repo.checkout_tree(&obj, None)?;
        repo.set_head(&format!("refs/heads/{name}"))?;
        debug!(branch = name, "checked out branch");

        Ok(())
    }
}

/// Tip of the default branch, trying the local ref then origin's
fn default_branch_oid(repo: &Repository, default_branch: &str) -> Option<git2::Oid> {
    repo.find_branch(default_branch, BranchType::Local)
        .ok()
        .and_then(|b| b.get().target())
        .or_else(|| {
            repo.find_branch(&format!("origin/{default_branch}"), BranchType::Remote)
                .ok()
                .and_then(|b| b.get().target())
        })
}
