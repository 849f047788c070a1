//! Merge-down step table
//!
//! Decides, per step, whether a failure degrades the run, stops it quietly,
//! or fails it. The orchestrator never decides this inline.

use crate::error::Error;

/// One step of a merge-down run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Compute the downstream branch
    ResolveTarget,
    /// Delete the head branch if it is a leftover candidate
    CleanupStaleCandidate,
    /// Check that the downstream branch exists
    VerifyTarget,
    /// Create the candidate branch (with collision retry)
    CreateCandidate,
    /// Merge the downstream branch into the candidate
    MergeTarget,
    /// Open the merge-down pull request
    CreatePullRequest,
    /// Turn on auto-merge for the pull request
    EnableAutoMerge,
    /// Assign the pull request to the original author
    AssignPullRequest,
}

/// What a failed step does to the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Warn and carry on with the next step
    Degrade,
    /// Warn and end the run successfully
    Stop,
    /// End the run as failed
    Abort,
}

impl Step {
    /// The failure policy of this step
    pub const fn on_failure(self) -> OnFailure {
        match self {
            Self::ResolveTarget | Self::VerifyTarget => OnFailure::Stop,
            Self::CreateCandidate | Self::CreatePullRequest => OnFailure::Abort,
            Self::CleanupStaleCandidate
            | Self::MergeTarget
            | Self::EnableAutoMerge
            | Self::AssignPullRequest => OnFailure::Degrade,
        }
    }

    /// Short name used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResolveTarget => "resolve target",
            Self::CleanupStaleCandidate => "clean up stale candidate",
            Self::VerifyTarget => "verify target",
            Self::CreateCandidate => "create candidate branch",
            Self::MergeTarget => "merge target",
            Self::CreatePullRequest => "create pull request",
            Self::EnableAutoMerge => "enable auto-merge",
            Self::AssignPullRequest => "assign pull request",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one step after applying the step table
#[derive(Debug)]
pub enum StepResult<T> {
    /// Step succeeded
    Done(T),
    /// Step failed, run continues
    Degraded(Error),
    /// Step failed, run ends successfully
    Stopped(Error),
    /// Step failed, run fails
    Fatal(Error),
}

/// Classify a step's raw result through the step table
pub fn settle<T>(step: Step, result: crate::error::Result<T>) -> StepResult<T> {
    match result {
        Ok(value) => StepResult::Done(value),
        Err(err) => match step.on_failure() {
            OnFailure::Degrade => StepResult::Degraded(err),
            OnFailure::Stop => StepResult::Stopped(err),
            OnFailure::Abort => StepResult::Fatal(err),
        },
    }
}
