//! Shared test utilities

#![allow(dead_code)]

mod mock_gateway;

pub use mock_gateway::*;

use merge_down::notify::StatusSink;
use merge_down::types::{FlowConfig, MergeEvent, RepoConfig};
use std::sync::Mutex;

/// A message sent to a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Warning(String),
    Failure(String),
}

/// Status sink that keeps every message for later inspection
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<Status>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Status> {
        self.messages.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Status::Info(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Status::Warning(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Status::Failure(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }
}

impl StatusSink for RecordingSink {
    fn info(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(Status::Info(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(Status::Warning(message.to_string()));
    }

    fn failure(&self, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(Status::Failure(message.to_string()));
    }
}

/// Standard repository config for tests
pub fn github_config() -> RepoConfig {
    RepoConfig {
        owner: "acme".to_string(),
        repo: "widgets".to_string(),
    }
}

/// Flow without a branch prefix
pub fn plain_flow() -> FlowConfig {
    FlowConfig::default()
}

/// A merged pull request event
pub fn merge_event(base: &str, head: &str) -> MergeEvent {
    MergeEvent {
        base_branch: base.to_string(),
        head_branch: head.to_string(),
        head_sha: "head123".to_string(),
        pull_request_number: 42,
        author_login: "octocat".to_string(),
    }
}
