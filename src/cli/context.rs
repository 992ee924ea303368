//! Shared command context
//!
//! Common setup for the next/decide/state commands: resolve configuration,
//! open the working copy, build the host client, and load the persisted
//! workflow state. Incomplete configuration is a first-class outcome, not an
//! error, so commands can surface the missing fields in their own format.

use std::path::{Path, PathBuf};

use nudge::config::{load_config, Config, LoadedConfig};
use nudge::error::Result;
use nudge::provider::github::HostConfig;
use nudge::provider::{GitHubHost, GitRepo};
use nudge::state::{load_state, save_state, WorkflowState};
use nudge::types::ConfigRequest;

/// Everything a command needs to talk to the providers and the state record
pub struct CommandContext {
    /// Local repository provider
    pub repo: GitRepo,
    /// Code host provider
    pub host: GitHubHost,
    /// Resolved configuration
    pub config: Config,
    /// Persisted workflow state
    pub state: WorkflowState,
    /// Working-copy root, where the state record lives
    workspace_root: PathBuf,
}

/// Outcome of context construction
pub enum ContextResult {
    /// Ready to run
    Ready(Box<CommandContext>),
    /// Configuration is missing required fields
    ConfigMissing(ConfigRequest),
}

impl CommandContext {
    /// Build the context for the working copy at `path`
    pub fn new(path: &Path) -> Result<ContextResult> {
        let config = match load_config(path)? {
            LoadedConfig::Ready(config) => config,
            LoadedConfig::Incomplete(request) => {
                return Ok(ContextResult::ConfigMissing(request));
            }
        };

        let repo = GitRepo::open(path, &config.default_branch)?;
        let host = GitHubHost::new(
            &config.token,
            HostConfig {
                owner: config.owner.clone(),
                repo: config.repo.clone(),
                host: config.host.clone(),
            },
        )?;

        let workspace_root = repo.root().to_path_buf();
        let state = load_state(&workspace_root)?;

        Ok(ContextResult::Ready(Box::new(Self {
            repo,
            host,
            config,
            state,
            workspace_root,
        })))
    }

    /// Persist the workflow state back to disk
    pub fn save_state(&self) -> Result<()> {
        save_state(&self.workspace_root, &self.state)
    }
}
