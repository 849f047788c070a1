//! Mock repository gateway for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use merge_down::error::{Error, Result};
use merge_down::platform::RepositoryGateway;
use merge_down::types::{Branch, MergeMethod, MergeStatus, PullRequest, RefDeletion, RepoConfig};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_ref`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRefCall {
    pub branch: String,
    pub sha: String,
}

/// Call record for `merge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub base: String,
    pub head: String,
}

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub title: String,
    pub base: String,
    pub head: String,
    pub body: String,
}

/// Call record for `enable_auto_merge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoMergeCall {
    pub pull_request_id: String,
    pub method: MergeMethod,
}

/// Call record for `update_issue_assignees`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignCall {
    pub number: u64,
    pub logins: Vec<String>,
}

/// In-memory repository gateway
///
/// Branches live in a map from name to SHA, so creating a ref that already
/// exists fails the way GitHub does.
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking for verification
/// - Configurable merge status
/// - Error injection and hanging calls for failure path testing
pub struct MockGateway {
    config: RepoConfig,
    next_pr_number: AtomicU64,
    branches: Mutex<HashMap<String, String>>,
    merge_status: Mutex<MergeStatus>,
    // Call tracking
    delete_ref_calls: Mutex<Vec<String>>,
    get_branch_calls: Mutex<Vec<String>>,
    create_ref_calls: Mutex<Vec<CreateRefCall>>,
    merge_calls: Mutex<Vec<MergeCall>>,
    create_pr_calls: Mutex<Vec<CreatePrCall>>,
    resolve_id_calls: Mutex<Vec<u64>>,
    auto_merge_calls: Mutex<Vec<AutoMergeCall>>,
    assign_calls: Mutex<Vec<AssignCall>>,
    // Error injection
    error_on_delete_ref: Mutex<Option<String>>,
    error_on_create_ref: Mutex<Option<String>>,
    error_on_merge: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_resolve_id: Mutex<Option<String>>,
    error_on_auto_merge: Mutex<Option<String>>,
    error_on_assign: Mutex<Option<String>>,
    hang_on: Mutex<HashSet<&'static str>>,
}

impl MockGateway {
    /// Create a new mock with the given config and no branches
    pub fn with_config(config: RepoConfig) -> Self {
        Self {
            config,
            next_pr_number: AtomicU64::new(100),
            branches: Mutex::new(HashMap::new()),
            merge_status: Mutex::new(MergeStatus::Merged),
            delete_ref_calls: Mutex::new(Vec::new()),
            get_branch_calls: Mutex::new(Vec::new()),
            create_ref_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            resolve_id_calls: Mutex::new(Vec::new()),
            auto_merge_calls: Mutex::new(Vec::new()),
            assign_calls: Mutex::new(Vec::new()),
            error_on_delete_ref: Mutex::new(None),
            error_on_create_ref: Mutex::new(None),
            error_on_merge: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_resolve_id: Mutex::new(None),
            error_on_auto_merge: Mutex::new(None),
            error_on_assign: Mutex::new(None),
            hang_on: Mutex::new(HashSet::new()),
        }
    }

    // === Setup methods ===

    /// Add a branch pointing at `sha`
    pub fn add_branch(&self, name: &str, sha: &str) {
        self.branches
            .lock()
            .unwrap()
            .insert(name.to_string(), sha.to_string());
    }

    /// Whether a branch currently exists
    pub fn has_branch(&self, name: &str) -> bool {
        self.branches.lock().unwrap().contains_key(name)
    }

    /// Set the status returned by `merge`
    pub fn set_merge_status(&self, status: MergeStatus) {
        *self.merge_status.lock().unwrap() = status;
    }

    // === Error injection methods ===

    /// Make `delete_ref` return an error
    pub fn fail_delete_ref(&self, msg: &str) {
        *self.error_on_delete_ref.lock().unwrap() = Some(msg.to_string());
    }

    /// Make every `create_ref` return an error
    pub fn fail_create_ref(&self, msg: &str) {
        *self.error_on_create_ref.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge` return an error
    pub fn fail_merge(&self, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pull_request` return an error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `resolve_pull_request_id` return an error
    pub fn fail_resolve_id(&self, msg: &str) {
        *self.error_on_resolve_id.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `enable_auto_merge` return an error
    pub fn fail_auto_merge(&self, msg: &str) {
        *self.error_on_auto_merge.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `update_issue_assignees` return an error
    pub fn fail_assign(&self, msg: &str) {
        *self.error_on_assign.lock().unwrap() = Some(msg.to_string());
    }

    /// Make the named operation never complete
    pub fn hang_on(&self, operation: &'static str) {
        self.hang_on.lock().unwrap().insert(operation);
    }

    async fn maybe_hang(&self, operation: &'static str) {
        let hang = self.hang_on.lock().unwrap().contains(operation);
        if hang {
            std::future::pending::<()>().await;
        }
    }

    fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
        match slot.lock().unwrap().as_ref() {
            Some(msg) => Err(Error::GitHubApi(msg.clone())),
            None => Ok(()),
        }
    }

    // === Call inspection methods ===

    pub fn get_delete_ref_calls(&self) -> Vec<String> {
        self.delete_ref_calls.lock().unwrap().clone()
    }

    pub fn get_get_branch_calls(&self) -> Vec<String> {
        self.get_branch_calls.lock().unwrap().clone()
    }

    pub fn get_create_ref_calls(&self) -> Vec<CreateRefCall> {
        self.create_ref_calls.lock().unwrap().clone()
    }

    pub fn get_merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    pub fn get_create_pr_calls(&self) -> Vec<CreatePrCall> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    pub fn get_resolve_id_calls(&self) -> Vec<u64> {
        self.resolve_id_calls.lock().unwrap().clone()
    }

    pub fn get_auto_merge_calls(&self) -> Vec<AutoMergeCall> {
        self.auto_merge_calls.lock().unwrap().clone()
    }

    pub fn get_assign_calls(&self) -> Vec<AssignCall> {
        self.assign_calls.lock().unwrap().clone()
    }

    /// Total number of remote calls made
    pub fn call_count(&self) -> usize {
        self.delete_ref_calls.lock().unwrap().len()
            + self.get_branch_calls.lock().unwrap().len()
            + self.create_ref_calls.lock().unwrap().len()
            + self.merge_calls.lock().unwrap().len()
            + self.create_pr_calls.lock().unwrap().len()
            + self.resolve_id_calls.lock().unwrap().len()
            + self.auto_merge_calls.lock().unwrap().len()
            + self.assign_calls.lock().unwrap().len()
    }

    // === Assertion helpers ===

    /// Assert that a pull request was opened from `head` into `base`
    pub fn assert_create_pr_called(&self, head: &str, base: &str) {
        let calls = self.get_create_pr_calls();
        assert!(
            calls.iter().any(|c| c.head == head && c.base == base),
            "Expected create_pull_request({head} -> {base}), got: {calls:?}"
        );
    }

    /// Assert that nothing was created on the remote
    pub fn assert_nothing_created(&self) {
        assert!(
            self.get_create_ref_calls().is_empty(),
            "Expected no create_ref calls, got: {:?}",
            self.get_create_ref_calls()
        );
        assert!(
            self.get_create_pr_calls().is_empty(),
            "Expected no create_pull_request calls, got: {:?}",
            self.get_create_pr_calls()
        );
    }

    /// Assert that auto-merge was never requested
    pub fn assert_auto_merge_not_called(&self) {
        assert!(
            self.get_resolve_id_calls().is_empty() && self.get_auto_merge_calls().is_empty(),
            "Expected auto-merge not to be enabled, got: {:?}",
            self.get_auto_merge_calls()
        );
    }

    /// Assert that the pull request was assigned to `login`
    pub fn assert_assigned(&self, number: u64, login: &str) {
        let calls = self.get_assign_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.number == number && c.logins == [login.to_string()]),
            "Expected #{number} assigned to {login}, got: {calls:?}"
        );
    }
}

#[async_trait]
impl RepositoryGateway for MockGateway {
    async fn delete_ref(&self, branch: &str) -> Result<RefDeletion> {
        self.delete_ref_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        self.maybe_hang("delete_ref").await;
        Self::injected(&self.error_on_delete_ref)?;

        let removed = self.branches.lock().unwrap().remove(branch);
        Ok(if removed.is_some() {
            RefDeletion::Deleted
        } else {
            RefDeletion::NotFound
        })
    }

    async fn get_branch(&self, name: &str) -> Result<Option<Branch>> {
        self.get_branch_calls.lock().unwrap().push(name.to_string());
        self.maybe_hang("get_branch").await;

        Ok(self.branches.lock().unwrap().get(name).map(|sha| Branch {
            name: name.to_string(),
            sha: sha.clone(),
        }))
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()> {
        self.create_ref_calls.lock().unwrap().push(CreateRefCall {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        self.maybe_hang("create_ref").await;
        Self::injected(&self.error_on_create_ref)?;

        let mut branches = self.branches.lock().unwrap();
        if branches.contains_key(branch) {
            return Err(Error::RefAlreadyExists(branch.to_string()));
        }
        branches.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn merge(&self, base: &str, head: &str) -> Result<MergeStatus> {
        self.merge_calls.lock().unwrap().push(MergeCall {
            base: base.to_string(),
            head: head.to_string(),
        });
        self.maybe_hang("merge").await;
        Self::injected(&self.error_on_merge)?;

        Ok(self.merge_status.lock().unwrap().clone())
    }

    async fn create_pull_request(
        &self,
        title: &str,
        base: &str,
        head: &str,
        body: &str,
    ) -> Result<PullRequest> {
        self.create_pr_calls.lock().unwrap().push(CreatePrCall {
            title: title.to_string(),
            base: base.to_string(),
            head: head.to_string(),
            body: body.to_string(),
        });
        self.maybe_hang("create_pull_request").await;
        Self::injected(&self.error_on_create_pr)?;

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!(
                "https://github.com/{}/{}/pull/{number}",
                self.config.owner, self.config.repo
            ),
            base_ref: base.to_string(),
            head_ref: head.to_string(),
            title: title.to_string(),
        })
    }

    async fn resolve_pull_request_id(&self, number: u64) -> Result<String> {
        self.resolve_id_calls.lock().unwrap().push(number);
        self.maybe_hang("resolve_pull_request_id").await;
        Self::injected(&self.error_on_resolve_id)?;

        Ok(format!("PR_node_{number}"))
    }

    async fn enable_auto_merge(&self, pull_request_id: &str, method: MergeMethod) -> Result<()> {
        self.auto_merge_calls.lock().unwrap().push(AutoMergeCall {
            pull_request_id: pull_request_id.to_string(),
            method,
        });
        self.maybe_hang("enable_auto_merge").await;
        Self::injected(&self.error_on_auto_merge)
    }

    async fn update_issue_assignees(&self, number: u64, logins: &[String]) -> Result<()> {
        self.assign_calls.lock().unwrap().push(AssignCall {
            number,
            logins: logins.to_vec(),
        });
        self.maybe_hang("update_issue_assignees").await;
        Self::injected(&self.error_on_assign)
    }
}
