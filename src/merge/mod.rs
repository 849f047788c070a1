//! Merge-down engine
//!
//! Two-phase pattern:
//! 1. Plan - resolve the target and derive names and PR text (pure, testable)
//! 2. Execute - drive the remote repository step by step (effectful)

mod execute;
mod plan;
mod retry;
mod steps;

pub use execute::{
    DEFAULT_CALL_TIMEOUT, ExecuteOptions, MergeDownReport, execute_merge_down, run_merge_down,
};
pub use plan::{
    MergeDownPlan, candidate_branch_name, disambiguated_candidate_name, is_stale_candidate,
    plan_merge_down, pull_request_body, pull_request_title,
};
pub use retry::{RetryOn, RetryPolicy};
pub use steps::{OnFailure, Step, StepResult, settle};
