//! Merge-down execution - effectful operations
//!
//! This module contains the effectful code that drives the remote
//! repository. It takes a `MergeDownPlan` (created by the pure planning
//! functions) and runs the step sequence against the gateway, using the
//! step table to decide what each failure means.

use crate::error::{Error, Result};
use crate::merge::plan::{MergeDownPlan, plan_merge_down};
use crate::merge::retry::RetryPolicy;
use crate::merge::steps::{Step, StepResult, settle};
use crate::notify::StatusSink;
use crate::platform::RepositoryGateway;
use crate::types::{
    CandidateBranch, FlowConfig, GeneratedPullRequest, MergeEvent, MergeMethod, MergeOutcome,
    MergeStatus, RefDeletion,
};
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

/// Default limit for a single remote call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for merge-down execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Limit for each remote call (`None` waits indefinitely)
    pub call_timeout: Option<Duration>,
    /// Retry policy for candidate branch creation
    pub candidate_retry: RetryPolicy,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            candidate_retry: RetryPolicy::default(),
        }
    }
}

/// What a merge-down run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeDownReport {
    /// Downstream branch, if the base branch is in the flow
    pub target: Option<String>,
    /// Step at which the run stopped early (without failing)
    pub stopped_at: Option<Step>,
    /// Outcome of deleting a leftover candidate branch
    pub stale_candidate: Option<RefDeletion>,
    /// Candidate branch that was created
    pub candidate: Option<CandidateBranch>,
    /// Whether the target merged cleanly into the candidate
    pub merge_outcome: Option<MergeOutcome>,
    /// Pull request that was opened
    pub pull_request: Option<GeneratedPullRequest>,
    /// Whether auto-merge was enabled
    pub auto_merge_enabled: bool,
    /// Whether the pull request was assigned
    pub assigned: bool,
    /// Warnings reported during the run
    pub warnings: Vec<String>,
}

/// Why the step sequence ended before the last step
enum Halt {
    Stop,
    Fatal(Error),
}

/// Run a remote call, failing with `Error::Timeout` if it takes too long
async fn remote<T>(
    timeout: Option<Duration>,
    operation: &str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| Error::Timeout {
                operation: operation.to_string(),
                after,
            })?,
        None => call.await,
    }
}

struct Run<'a> {
    gateway: &'a dyn RepositoryGateway,
    sink: &'a dyn StatusSink,
    options: &'a ExecuteOptions,
    report: MergeDownReport,
}

impl Run<'_> {
    fn warn(&mut self, message: String) {
        self.sink.warning(&message);
        self.report.warnings.push(message);
    }

    /// Apply the step table to a step result
    ///
    /// `Ok(None)` means the step failed and the run carries on.
    fn apply<T>(&mut self, step: Step, result: Result<T>) -> std::result::Result<Option<T>, Halt> {
        match settle(step, result) {
            StepResult::Done(value) => Ok(Some(value)),
            StepResult::Degraded(e) => {
                self.warn(format!("{step}: {e}"));
                Ok(None)
            }
            StepResult::Stopped(e) => {
                self.warn(e.to_string());
                self.report.stopped_at = Some(step);
                Err(Halt::Stop)
            }
            StepResult::Fatal(e) => {
                error!(%step, error = %e, "merge-down failed");
                Err(Halt::Fatal(e))
            }
        }
    }

    async fn steps(&mut self, plan: &MergeDownPlan) -> std::result::Result<(), Halt> {
        let timeout = self.options.call_timeout;
        let gateway = self.gateway;

        self.sink.info(&format!(
            "Merging down #{} from {} into {}",
            plan.origin_pr, plan.base, plan.target
        ));

        // Leftover candidate from an earlier merge-down
        if let Some(stale) = &plan.stale_candidate {
            let result = remote(timeout, "delete_ref", gateway.delete_ref(stale)).await;
            if let Some(deletion) = self.apply(Step::CleanupStaleCandidate, result)? {
                match deletion {
                    RefDeletion::Deleted => {
                        self.sink
                            .info(&format!("Deleted stale candidate branch {stale}"));
                    }
                    RefDeletion::NotFound => debug!(branch = %stale, "no stale candidate to delete"),
                }
                self.report.stale_candidate = Some(deletion);
            }
        }

        let result = remote(timeout, "get_branch", gateway.get_branch(&plan.target))
            .await
            .and_then(|branch| branch.ok_or_else(|| Error::BranchNotFound(plan.target.clone())));
        self.apply(Step::VerifyTarget, result)?;

        let candidate = self.create_candidate(plan).await;
        let Some(candidate) = self.apply(Step::CreateCandidate, candidate)? else {
            return Ok(());
        };
        self.sink
            .info(&format!("Created candidate branch {}", candidate.name));
        self.report.candidate = Some(candidate.clone());

        let result = remote(timeout, "merge", gateway.merge(&candidate.name, &plan.target))
            .await
            .and_then(|status| match status {
                MergeStatus::Merged | MergeStatus::UpToDate => Ok(()),
                MergeStatus::Conflict => Err(Error::MergeConflict {
                    base: candidate.name.clone(),
                    head: plan.target.clone(),
                }),
            });
        let outcome = match self.apply(Step::MergeTarget, result)? {
            Some(()) => MergeOutcome::Clean,
            None => MergeOutcome::Conflicted,
        };
        debug!(%outcome, "merged target into candidate");
        self.report.merge_outcome = Some(outcome);

        let result = remote(
            timeout,
            "create_pull_request",
            gateway.create_pull_request(
                &plan.pull_request_title(),
                &plan.target,
                &candidate.name,
                &plan.pull_request_body(&candidate.name),
            ),
        )
        .await
        .map_err(|source| Error::PullRequest {
            head: candidate.name.clone(),
            base: plan.target.clone(),
            source: Box::new(source),
        });
        let Some(pr) = self.apply(Step::CreatePullRequest, result)? else {
            return Ok(());
        };
        self.sink
            .info(&format!("Opened pull request #{}: {}", pr.number, pr.html_url));
        self.report.pull_request = Some(GeneratedPullRequest {
            number: pr.number,
            html_url: pr.html_url,
            base: plan.target.clone(),
            head: candidate.name.clone(),
            assignee: plan.assignee.clone(),
        });

        if outcome == MergeOutcome::Clean {
            // Id lookup and mutation succeed or fail together
            let result = async {
                let id = remote(
                    timeout,
                    "resolve_pull_request_id",
                    gateway.resolve_pull_request_id(pr.number),
                )
                .await?;
                remote(
                    timeout,
                    "enable_auto_merge",
                    gateway.enable_auto_merge(&id, MergeMethod::Merge),
                )
                .await
            }
            .await;
            if self.apply(Step::EnableAutoMerge, result)?.is_some() {
                self.sink
                    .info(&format!("Enabled auto-merge for #{}", pr.number));
                self.report.auto_merge_enabled = true;
            }
        } else {
            self.warn(format!(
                "Not enabling auto-merge for #{}: the merge has conflicts",
                pr.number
            ));
        }

        let result = remote(
            timeout,
            "update_issue_assignees",
            gateway.update_issue_assignees(pr.number, std::slice::from_ref(&plan.assignee)),
        )
        .await;
        if self.apply(Step::AssignPullRequest, result)?.is_some() {
            self.sink
                .info(&format!("Assigned #{} to {}", pr.number, plan.assignee));
            self.report.assigned = true;
        }

        Ok(())
    }

    /// Create the candidate branch, retrying under a disambiguated name
    async fn create_candidate(&self, plan: &MergeDownPlan) -> Result<CandidateBranch> {
        let timeout = self.options.call_timeout;
        let gateway = self.gateway;
        let sink = self.sink;
        let sha = plan.source_sha.as_str();
        let mut last_token = 0_i64;
        let mut attempted: Vec<String> = Vec::new();

        let created = self
            .options
            .candidate_retry
            .run(|attempt| {
                let name = if attempt == 1 {
                    plan.candidate_name.clone()
                } else {
                    // strictly increasing even within the same millisecond
                    last_token = Utc::now().timestamp_millis().max(last_token + 1);
                    plan.disambiguated_candidate_name(last_token)
                };
                if let Some(previous) = attempted.last() {
                    sink.info(&format!(
                        "Could not create {previous}, retrying as {name}"
                    ));
                }
                attempted.push(name.clone());
                async move {
                    remote(timeout, "create_ref", gateway.create_ref(&name, sha)).await?;
                    Ok(name)
                }
            })
            .await;

        match created {
            Ok(name) => Ok(CandidateBranch {
                name,
                source_sha: plan.source_sha.clone(),
            }),
            Err(source) => Err(Error::CandidateBranch {
                branch: attempted.pop().unwrap_or_default(),
                source: Box::new(source),
            }),
        }
    }
}

/// Execute the merge-down plan (EFFECTFUL)
///
/// Runs cleanup, target verification, candidate creation, merge, pull
/// request creation, auto-merge and assignment in order, one remote call at
/// a time.
///
/// # Returns
/// The report of the run. Only a failure to create the candidate branch or
/// the pull request is returned as an error.
pub async fn execute_merge_down(
    plan: &MergeDownPlan,
    gateway: &dyn RepositoryGateway,
    sink: &dyn StatusSink,
    options: &ExecuteOptions,
) -> Result<MergeDownReport> {
    let mut run = Run {
        gateway,
        sink,
        options,
        report: MergeDownReport {
            target: Some(plan.target.clone()),
            ..MergeDownReport::default()
        },
    };

    match run.steps(plan).await {
        Ok(()) | Err(Halt::Stop) => Ok(run.report),
        Err(Halt::Fatal(e)) => Err(e),
    }
}

/// Plan and execute a merge-down for one merged pull request
///
/// A base branch outside the flow ends the run with a warning.
pub async fn run_merge_down(
    event: &MergeEvent,
    flow: &FlowConfig,
    gateway: &dyn RepositoryGateway,
    sink: &dyn StatusSink,
    options: &ExecuteOptions,
) -> Result<MergeDownReport> {
    let planned = plan_merge_down(event, flow).ok_or_else(|| Error::NotInFlow(event.base_branch.clone()));

    match settle(Step::ResolveTarget, planned) {
        StepResult::Done(plan) => execute_merge_down(&plan, gateway, sink, options).await,
        StepResult::Stopped(e) | StepResult::Degraded(e) => {
            let message = e.to_string();
            sink.warning(&message);
            Ok(MergeDownReport {
                stopped_at: Some(Step::ResolveTarget),
                warnings: vec![message],
                ..MergeDownReport::default()
            })
        }
        StepResult::Fatal(e) => Err(e),
    }
}
