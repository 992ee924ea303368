//! Error types for nudge

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// A data provider could not be reached or returned malformed data.
    ///
    /// The aggregator converts these into degraded "unknown" facts; when one
    /// escapes to the caller it means the fact was required, not advisory.
    #[error("provider unavailable: {0}")]
    Provider(String),

    /// Required configuration is missing; carries the missing field names.
    #[error("configuration incomplete: missing {}", .0.join(", "))]
    ConfigIncomplete(Vec<String>),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Decision id is malformed or does not name a decision we issued.
    #[error("decision not found: {0}")]
    DecisionNotFound(String),

    /// Selected choice was not among the choices offered for the decision.
    #[error("invalid choice '{choice}' for decision {decision}")]
    InvalidChoice {
        /// The decision id being resumed
        decision: String,
        /// The offending choice id
        choice: String,
    },

    /// Aggregated state violates an invariant the resolver depends on.
    ///
    /// Fatal to the single resolution; the process stays usable.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Workflow-state record could not be loaded or saved.
    #[error("state error: {0}")]
    State(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Local git operation failed
    #[error("git error: {0}")]
    Git(String),

    /// Internal error (bugs, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<octocrab::Error> for Error {
    fn from(e: octocrab::Error) -> Self {
        Self::GitHubApi(e.to_string())
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        Self::Git(e.message().to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
