//! Configuration
//!
//! Layered: built-in defaults, then the user file
//! (`~/.config/nudge/config.toml`), then the per-repo file (`.nudge.toml` at
//! the working-copy root), then `NUDGE_*` environment variables. Owner and
//! repo fall back to whatever the `origin` remote URL names. Missing required
//! fields are reported as a `ConfigRequest`, never as a panic.

use std::env;
use std::path::Path;

use git2::Repository;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::types::ConfigRequest;

/// Default epic label when none is configured
const DEFAULT_EPIC_LABEL: &str = "epic";
/// Default branch when none is configured or detectable
const DEFAULT_BRANCH: &str = "main";

/// Partial configuration as read from one layer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Repository owner (user or organization)
    pub owner: Option<String>,
    /// Repository name
    pub repo: Option<String>,
    /// API token
    pub token: Option<String>,
    /// Custom host for GitHub Enterprise
    pub host: Option<String>,
    /// Default branch name
    pub default_branch: Option<String>,
    /// Label marking an issue as an Epic
    pub epic_label: Option<String>,
}

impl ConfigFile {
    /// Overlay `over` on top of `self`; set fields in `over` win
    fn merge(self, over: Self) -> Self {
        Self {
            owner: over.owner.or(self.owner),
            repo: over.repo.or(self.repo),
            token: over.token.or(self.token),
            host: over.host.or(self.host),
            default_branch: over.default_branch.or(self.default_branch),
            epic_label: over.epic_label.or(self.epic_label),
        }
    }

    /// Read one TOML layer; a missing file is an empty layer
    fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config at {}: {e}", path.display())))
    }

    /// Layer built from `NUDGE_*` variables (`GITHUB_TOKEN` also accepted)
    fn from_env() -> Self {
        Self {
            owner: env::var("NUDGE_OWNER").ok(),
            repo: env::var("NUDGE_REPO").ok(),
            token: env::var("NUDGE_TOKEN")
                .or_else(|_| env::var("GITHUB_TOKEN"))
                .ok(),
            host: env::var("NUDGE_HOST").ok(),
            default_branch: env::var("NUDGE_DEFAULT_BRANCH").ok(),
            epic_label: env::var("NUDGE_EPIC_LABEL").ok(),
        }
    }
}

/// Fully-resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// API token
    pub token: String,
    /// Custom host, if not github.com
    pub host: Option<String>,
    /// Default branch name
    pub default_branch: String,
    /// Label marking an issue as an Epic
    pub epic_label: String,
}

/// Result of loading configuration
#[derive(Debug, Clone)]
pub enum LoadedConfig {
    /// Everything required is present
    Ready(Config),
    /// Required fields are missing; names listed for the caller to surface
    Incomplete(ConfigRequest),
}

/// Extract `(owner, repo)` from a remote URL.
///
/// Handles both `https://github.com/owner/repo.git` and the scp-like
/// `git@github.com:owner/repo.git` forms.
pub fn parse_remote_url(remote: &str) -> Option<(String, String)> {
    let path = if let Ok(url) = Url::parse(remote) {
        url.path().trim_start_matches('/').to_string()
    } else {
        // scp-like syntax has no scheme; the path follows the colon
        remote.split_once(':').map(|(_, p)| p.to_string())?
    };

    let path = path.trim_end_matches('/').trim_end_matches(".git");
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

/// Owner/repo from the working copy's `origin` remote, when present
fn origin_owner_repo(repo_root: &Path) -> Option<(String, String)> {
    let repo = Repository::discover(repo_root).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    let parsed = remote.url().and_then(parse_remote_url);
    if let Some((ref owner, ref name)) = parsed {
        debug!(owner, repo = name, "derived owner/repo from origin remote");
    }
    parsed
}

/// Load the layered configuration for a working copy
pub fn load_config(repo_root: &Path) -> Result<LoadedConfig> {
    let mut layered = ConfigFile::default();

    if let Some(config_dir) = dirs::config_dir() {
        let user_file = config_dir.join("nudge").join("config.toml");
        layered = layered.merge(ConfigFile::from_path(&user_file)?);
    }
    layered = layered.merge(ConfigFile::from_path(&repo_root.join(".nudge.toml"))?);
    layered = layered.merge(ConfigFile::from_env());

    if layered.owner.is_none() || layered.repo.is_none() {
        if let Some((owner, repo)) = origin_owner_repo(repo_root) {
            layered.owner.get_or_insert(owner);
            layered.repo.get_or_insert(repo);
        }
    }

    let mut missing = Vec::new();
    if layered.owner.is_none() {
        missing.push("owner".to_string());
    }
    if layered.repo.is_none() {
        missing.push("repo".to_string());
    }
    if layered.token.is_none() {
        missing.push("token".to_string());
    }
    if !missing.is_empty() {
        return Ok(LoadedConfig::Incomplete(ConfigRequest { missing }));
    }

    // All three checked present above
    let (Some(owner), Some(repo), Some(token)) = (layered.owner, layered.repo, layered.token)
    else {
        return Err(Error::Internal("config fields vanished after check".to_string()));
    };

    Ok(LoadedConfig::Ready(Config {
        owner,
        repo,
        token,
        host: layered.host,
        default_branch: layered
            .default_branch
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        epic_label: layered
            .epic_label
            .unwrap_or_else(|| DEFAULT_EPIC_LABEL.to_string()),
    }))
}
