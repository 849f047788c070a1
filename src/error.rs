//! Error types for merge-down

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the resolver, gateway, and orchestrator
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API returned an error or an unexpected response
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// A ref with this name already exists on the remote
    #[error("reference already exists: {0}")]
    RefAlreadyExists(String),

    /// A remote call did not finish within the configured timeout
    #[error("timed out after {}s waiting for {operation}", .after.as_secs())]
    Timeout {
        /// Name of the remote operation
        operation: String,
        /// Configured timeout
        after: Duration,
    },

    /// Branch is not a release or development branch of the flow
    #[error("branch '{0}' is not part of the merge-down flow, nothing to do")]
    NotInFlow(String),

    /// Branch does not exist on the remote
    #[error("branch '{0}' does not exist, skipping merge-down")]
    BranchNotFound(String),

    /// The remote could not merge two branches cleanly
    #[error("'{head}' does not merge cleanly into '{base}', conflicts must be resolved by hand")]
    MergeConflict {
        /// Branch receiving the merge
        base: String,
        /// Branch being merged
        head: String,
    },

    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Event payload could not be interpreted
    #[error("invalid event payload: {0}")]
    Event(String),

    /// Candidate branch could not be created, even after retrying
    #[error("failed to create candidate branch '{branch}'")]
    CandidateBranch {
        /// Name used on the last attempt
        branch: String,
        /// Failure from the last attempt
        #[source]
        source: Box<Error>,
    },

    /// Merge-down pull request could not be opened
    #[error("failed to create pull request from '{head}' into '{base}'")]
    PullRequest {
        /// Candidate branch
        head: String,
        /// Target branch
        base: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Octocrab client error
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error marks a failed run rather than a degraded one
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CandidateBranch { .. } | Self::PullRequest { .. })
    }
}

/// Result type alias for merge-down operations
pub type Result<T> = std::result::Result<T, Error>;
