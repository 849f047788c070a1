//! Core types for merge-down

use serde::{Deserialize, Serialize};

/// A pull request that was merged and may need to flow downstream
///
/// Supplied once per invocation and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeEvent {
    /// Branch the pull request merged into
    pub base_branch: String,
    /// Branch the pull request came from
    pub head_branch: String,
    /// Head commit of the merged pull request
    pub head_sha: String,
    /// Number of the merged pull request
    pub pull_request_number: u64,
    /// Login of the pull request author
    pub author_login: String,
}

/// Branch flow configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowConfig {
    /// Prefix in front of every version branch (e.g. `rhino-`)
    pub branch_prefix: String,
}

/// Repository coordinates for the hosted service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

/// A remote branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name (without `refs/heads/`)
    pub name: String,
    /// Commit the branch points at
    pub sha: String,
}

/// Branch created to stage a merge-down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateBranch {
    /// Branch name
    pub name: String,
    /// Commit the branch was created from
    pub source_sha: String,
}

/// Whether the target branch merged cleanly into the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merge succeeded (or nothing to merge)
    Clean,
    /// Merge failed, conflicts need manual resolution
    Conflicted,
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Conflicted => write!(f, "conflicted"),
        }
    }
}

/// Result of a ref deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefDeletion {
    /// Ref existed and was deleted
    Deleted,
    /// Ref did not exist
    NotFound,
}

/// Result of asking the service to merge one branch into another
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    /// A merge commit was created
    Merged,
    /// Base already contains head
    UpToDate,
    /// The branches conflict
    Conflict,
}

/// A pull request returned by the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR title
    pub title: String,
}

/// Pull request opened by a merge-down run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Target branch
    pub base: String,
    /// Candidate branch
    pub head: String,
    /// Login the PR is assigned to
    pub assignee: String,
}

/// Merge strategy used when auto-merge fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Create a merge commit
    Merge,
}

impl MergeMethod {
    /// GraphQL `PullRequestMergeMethod` enum value
    pub const fn as_graphql(self) -> &'static str {
        match self {
            Self::Merge => "MERGE",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
        }
    }
}
