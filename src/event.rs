//! Merge events from GitHub `pull_request` webhook payloads

use crate::error::{Error, Result};
use crate::types::MergeEvent;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct Payload {
    action: Option<String>,
    pull_request: Option<PayloadPullRequest>,
}

#[derive(Deserialize)]
struct PayloadPullRequest {
    number: u64,
    #[serde(default)]
    merged: bool,
    base: PayloadRef,
    head: PayloadRef,
    user: Option<PayloadUser>,
}

#[derive(Deserialize)]
struct PayloadRef {
    #[serde(rename = "ref")]
    ref_field: String,
    sha: String,
}

#[derive(Deserialize)]
struct PayloadUser {
    login: String,
}

/// Parse a `pull_request` webhook payload
///
/// Returns `None` unless the payload describes a pull request that was
/// closed by merging.
pub fn parse_merge_event(json: &str) -> Result<Option<MergeEvent>> {
    let payload: Payload = serde_json::from_str(json)?;

    let pr = payload
        .pull_request
        .ok_or_else(|| Error::Event("payload has no pull_request".to_string()))?;

    if payload.action.as_deref() != Some("closed") || !pr.merged {
        return Ok(None);
    }

    let author = pr
        .user
        .ok_or_else(|| Error::Event(format!("pull request #{} has no author", pr.number)))?;

    Ok(Some(MergeEvent {
        base_branch: pr.base.ref_field,
        head_branch: pr.head.ref_field,
        head_sha: pr.head.sha,
        pull_request_number: pr.number,
        author_login: author.login,
    }))
}

/// Read and parse a webhook payload file (`GITHUB_EVENT_PATH`)
pub fn load_merge_event(path: &Path) -> Result<Option<MergeEvent>> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Event(format!("failed to read {}: {e}", path.display())))?;
    parse_merge_event(&content)
}
