//! Persistence for the workflow-state record in `.git/nudge/`

use super::{WorkflowState, STATE_VERSION};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name for nudge metadata within `.git/`
const NUDGE_DIR: &str = "nudge";

/// Filename for the workflow-state record
const STATE_FILE: &str = "state.json";

/// Resolve the `.git` path, handling worktree indirection.
///
/// In linked worktrees, `.git` is a plain text file containing
/// `gitdir: <path>`. We read it and use its target as the metadata root so
/// every worktree of a repository shares one record per working copy.
fn resolve_git_dir(workspace_root: &Path) -> PathBuf {
    let git_path = workspace_root.join(".git");

    if git_path.is_file() {
        if let Ok(contents) = fs::read_to_string(&git_path) {
            if let Some(target) = contents.strip_prefix("gitdir:") {
                let target = PathBuf::from(target.trim());
                if target.is_dir() {
                    return fs::canonicalize(&target).unwrap_or(target);
                }
            }
        }
        // Pointer file exists but is invalid - return as-is to surface error
        return git_path;
    }

    git_path
}

fn nudge_dir(workspace_root: &Path) -> PathBuf {
    resolve_git_dir(workspace_root).join(NUDGE_DIR)
}

/// Path to the workflow-state record for a working copy
pub fn state_path(workspace_root: &Path) -> PathBuf {
    nudge_dir(workspace_root).join(STATE_FILE)
}

/// Load the workflow state from disk.
///
/// Returns a default `WorkflowState` if the record doesn't exist yet.
pub fn load_state(workspace_root: &Path) -> Result<WorkflowState> {
    let path = state_path(workspace_root);

    if !path.exists() {
        return Ok(WorkflowState::new());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::State(format!("failed to read {}: {e}", path.display())))?;

    let state: WorkflowState = serde_json::from_str(&content)
        .map_err(|e| Error::State(format!("failed to parse {}: {e}", path.display())))?;

    Ok(state)
}

/// Save the workflow state to disk.
///
/// Creates the `.git/nudge/` directory if needed. Writes to a temporary file
/// and renames it into place so a crashed write never corrupts the record.
pub fn save_state(workspace_root: &Path, state: &WorkflowState) -> Result<()> {
    let dir = nudge_dir(workspace_root);
    let path = dir.join(STATE_FILE);

    if !dir.exists() {
        fs::create_dir_all(&dir)
            .map_err(|e| Error::State(format!("failed to create {}: {e}", dir.display())))?;
    }

    let mut state_to_save = state.clone();
    state_to_save.version = STATE_VERSION;

    let content = serde_json::to_string_pretty(&state_to_save)
        .map_err(|e| Error::State(format!("failed to serialize workflow state: {e}")))?;

    let tmp = dir.join(format!("{STATE_FILE}.tmp"));
    fs::write(&tmp, content)
        .map_err(|e| Error::State(format!("failed to write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, &path)
        .map_err(|e| Error::State(format!("failed to write {}: {e}", path.display())))?;

    Ok(())
}
