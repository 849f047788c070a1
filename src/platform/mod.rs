//! Remote repository services
//!
//! Provides the interface the merge-down orchestrator drives against the
//! hosted repository.

mod github;

pub use github::{DEFAULT_API_URL, GitHubGateway};

use crate::error::Result;
use crate::types::{Branch, MergeMethod, MergeStatus, PullRequest, RefDeletion};
use async_trait::async_trait;

/// Repository gateway trait for branch, merge and PR operations
///
/// Owner and repository are bound when the gateway is constructed, so the
/// orchestrator only passes branch names and PR numbers.
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Delete a branch ref
    ///
    /// A ref that does not exist is reported as [`RefDeletion::NotFound`],
    /// not as an error.
    async fn delete_ref(&self, branch: &str) -> Result<RefDeletion>;

    /// Look up a branch, returning `None` if it does not exist
    async fn get_branch(&self, name: &str) -> Result<Option<Branch>>;

    /// Create a branch ref pointing at `sha`
    ///
    /// Fails with [`Error::RefAlreadyExists`] if the name is taken.
    ///
    /// [`Error::RefAlreadyExists`]: crate::error::Error::RefAlreadyExists
    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()>;

    /// Merge `head` into `base` on the remote
    async fn merge(&self, base: &str, head: &str) -> Result<MergeStatus>;

    /// Open a pull request
    async fn create_pull_request(
        &self,
        title: &str,
        base: &str,
        head: &str,
        body: &str,
    ) -> Result<PullRequest>;

    /// Resolve the opaque node id of a pull request
    async fn resolve_pull_request_id(&self, number: u64) -> Result<String>;

    /// Enable auto-merge on a pull request identified by node id
    async fn enable_auto_merge(&self, pull_request_id: &str, method: MergeMethod) -> Result<()>;

    /// Add assignees to the issue backing a pull request
    async fn update_issue_assignees(&self, number: u64, logins: &[String]) -> Result<()>;
}
