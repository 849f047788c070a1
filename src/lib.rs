//! merge-down: propagate merged pull requests down the version lineage
//!
//! When a pull request merges into a release branch (`1.2`) or a development
//! branch (`1.x`), merge-down creates a candidate branch, merges the next
//! branch in the lineage into it, and opens an auto-merging pull request
//! into that branch.

pub mod config;
pub mod error;
pub mod event;
pub mod flow;
pub mod merge;
pub mod notify;
pub mod platform;
pub mod types;
