//! Branch flow resolution - pure functions
//!
//! Maps a branch in the version lineage to the branch its changes flow into:
//! release branches (`1.2`) flow into their development branch (`1.x`), and
//! development branches (`1.x`) flow into the next major (`2.x`).
//! No I/O happens here.

use regex::Regex;
use std::sync::LazyLock;

static DEVELOPMENT_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.x$").expect("valid development branch regex"));

static RELEASE_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)$").expect("valid release branch regex"));

/// Position of a branch in the version lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// `<prefix><major>.x`
    Development {
        /// Major version
        major: u64,
    },
    /// `<prefix><major>.<minor>`
    Release {
        /// Major version
        major: u64,
        /// Minor version
        minor: u64,
    },
}

impl BranchKind {
    /// Branch name of the next branch in the flow, or `None` at the end of
    /// the representable version range
    pub fn downstream(self, prefix: &str) -> Option<String> {
        match self {
            Self::Development { major } => major
                .checked_add(1)
                .map(|next| format!("{prefix}{next}.x")),
            Self::Release { major, .. } => Some(format!("{prefix}{major}.x")),
        }
    }
}

/// Match `<prefix><N>.x`
pub fn match_development(branch: &str, prefix: &str) -> Option<u64> {
    let rest = branch.strip_prefix(prefix)?;
    let caps = DEVELOPMENT_BRANCH.captures(rest)?;
    caps[1].parse().ok()
}

/// Match `<prefix><N>.<M>`
pub fn match_release(branch: &str, prefix: &str) -> Option<(u64, u64)> {
    let rest = branch.strip_prefix(prefix)?;
    let caps = RELEASE_BRANCH.captures(rest)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// Classify a branch, trying the development pattern before the release one
pub fn classify_branch(branch: &str, prefix: &str) -> Option<BranchKind> {
    if let Some(major) = match_development(branch, prefix) {
        return Some(BranchKind::Development { major });
    }
    match_release(branch, prefix).map(|(major, minor)| BranchKind::Release { major, minor })
}

/// Resolve the branch that `branch` merges down into
///
/// Returns `None` when the branch is not part of the flow. That is a normal
/// outcome, not an error.
pub fn resolve_target(branch: &str, prefix: &str) -> Option<String> {
    classify_branch(branch, prefix)?.downstream(prefix)
}
