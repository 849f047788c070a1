//! Merge-down planning - pure functions for creating merge-down plans
//!
//! This module contains the pure, testable logic: target resolution,
//! candidate naming and the generated pull request text.
//! No I/O happens here - all data is passed in, making it easy to unit test.

use crate::flow::{match_development, match_release, resolve_target};
use crate::types::{FlowConfig, MergeEvent};

/// Separator between the head branch and the target in candidate names
const MERGE_SEPARATOR: &str = "-merge-";

/// Merge-down plan - the functional core output
///
/// Describes every name and text the orchestrator needs. Created by
/// `plan_merge_down()` (pure) and executed by `execute_merge_down()`
/// (effectful).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDownPlan {
    /// Branch the event merged into
    pub base: String,
    /// Branch the changes flow into
    pub target: String,
    /// Head branch of the merged pull request
    pub head: String,
    /// Commit the candidate branch starts from
    pub source_sha: String,
    /// First-choice candidate branch name
    pub candidate_name: String,
    /// Head branch to delete first, if it is itself a leftover candidate
    pub stale_candidate: Option<String>,
    /// Number of the merged pull request
    pub origin_pr: u64,
    /// Login the generated pull request is assigned to
    pub assignee: String,
}

impl MergeDownPlan {
    /// Candidate name for a retry, disambiguated by `token`
    pub fn disambiguated_candidate_name(&self, token: i64) -> String {
        disambiguated_candidate_name(&self.head, &self.target, token)
    }

    /// Title of the generated pull request
    pub fn pull_request_title(&self) -> String {
        pull_request_title(&self.head, &self.target)
    }

    /// Body of the generated pull request for the given candidate branch
    pub fn pull_request_body(&self, candidate: &str) -> String {
        pull_request_body(self.origin_pr, &self.base, &self.target, candidate)
    }
}

/// Create a merge-down plan (PURE - no I/O, easily testable)
///
/// Returns `None` when the event's base branch is not part of the flow.
#[must_use]
pub fn plan_merge_down(event: &MergeEvent, flow: &FlowConfig) -> Option<MergeDownPlan> {
    let target = resolve_target(&event.base_branch, &flow.branch_prefix)?;

    let stale_candidate = is_stale_candidate(&event.head_branch, &flow.branch_prefix)
        .then(|| event.head_branch.clone());

    Some(MergeDownPlan {
        base: event.base_branch.clone(),
        candidate_name: candidate_branch_name(&event.head_branch, &target),
        target,
        head: event.head_branch.clone(),
        source_sha: event.head_sha.clone(),
        stale_candidate,
        origin_pr: event.pull_request_number,
        assignee: event.author_login.clone(),
    })
}

/// `<head>-merge-<target>`
pub fn candidate_branch_name(head: &str, target: &str) -> String {
    format!("{head}{MERGE_SEPARATOR}{target}")
}

/// `<head>-<token>-merge-<target>`
pub fn disambiguated_candidate_name(head: &str, target: &str, token: i64) -> String {
    format!("{head}-{token}{MERGE_SEPARATOR}{target}")
}

/// Whether `branch` looks like a candidate created by an earlier run
///
/// Matches a `-merge-<version branch>` suffix, where the version branch
/// follows the configured prefix.
pub fn is_stale_candidate(branch: &str, prefix: &str) -> bool {
    let Some((head, version)) = branch.rsplit_once(MERGE_SEPARATOR) else {
        return false;
    };
    !head.is_empty()
        && (match_development(version, prefix).is_some()
            || match_release(version, prefix).is_some())
}

/// Title of the generated pull request
pub fn pull_request_title(head: &str, target: &str) -> String {
    format!("Merge branch '{head}' into {target}")
}

/// Body of the generated pull request
pub fn pull_request_body(origin_pr: u64, base: &str, target: &str, candidate: &str) -> String {
    format!(
        "\
Merge-down of #{origin_pr} from `{base}` into `{target}`.

#{origin_pr} was merged into `{base}`. This pull request carries those changes \
forward into `{target}` through the candidate branch `{candidate}`, and merges \
automatically once required checks pass.

If the merge reported conflicts, resolve them locally:

```sh
git fetch origin
git checkout {candidate}
git merge origin/{target}
# resolve the conflicts and commit
git push origin {candidate}
```
"
    )
}
