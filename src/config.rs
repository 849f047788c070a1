//! Run configuration
//!
//! Built once at process entry from command-line options, falling back to
//! the GitHub Actions environment. Environment access goes through an
//! injected lookup so nothing else reads process state.

use crate::error::{Error, Result};
use crate::merge::DEFAULT_CALL_TIMEOUT;
use crate::platform::DEFAULT_API_URL;
use crate::types::{FlowConfig, RepoConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variables checked for the access token, in order
const TOKEN_VARS: [&str; 4] = [
    "INPUT_GITHUB-TOKEN",
    "INPUT_GITHUB_TOKEN",
    "GITHUB_TOKEN",
    "GH_TOKEN",
];

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Path to the webhook payload
    pub event_path: Option<PathBuf>,
    /// `owner/repo`
    pub repository: Option<String>,
    /// Version branch prefix
    pub branch_prefix: Option<String>,
    /// REST API base URL
    pub api_url: Option<String>,
    /// Per-call timeout in seconds, 0 disables it
    pub timeout_secs: Option<u64>,
    /// Plan only, no remote calls
    pub dry_run: bool,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the webhook payload
    pub event_path: PathBuf,
    /// Target repository (required unless dry run)
    pub repo: Option<RepoConfig>,
    /// Access token (required unless dry run)
    pub token: Option<String>,
    /// Branch flow settings
    pub flow: FlowConfig,
    /// REST API base URL
    pub api_url: String,
    /// Limit for each remote call
    pub call_timeout: Option<Duration>,
    /// Plan only, no remote calls
    pub dry_run: bool,
}

impl RepoConfig {
    /// Parse an `owner/repo` slug
    pub fn parse_repository(slug: &str) -> Result<Self> {
        match slug.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "repository must be 'owner/repo', got '{slug}'"
            ))),
        }
    }
}

impl RunConfig {
    /// Resolve configuration from explicit options and an environment lookup
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Actions exports unset inputs as empty strings
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let event_path = overrides
            .event_path
            .or_else(|| var("GITHUB_EVENT_PATH").map(PathBuf::from))
            .ok_or_else(|| {
                Error::Config("no event payload: pass --event-path or set GITHUB_EVENT_PATH".to_string())
            })?;

        let repo = overrides
            .repository
            .or_else(|| var("GITHUB_REPOSITORY"))
            .map(|slug| RepoConfig::parse_repository(&slug))
            .transpose()?;

        let token = TOKEN_VARS.iter().find_map(|&name| var(name));

        if !overrides.dry_run {
            if repo.is_none() {
                return Err(Error::Config(
                    "no repository: pass --repository or set GITHUB_REPOSITORY".to_string(),
                ));
            }
            if token.is_none() {
                return Err(Error::Config(
                    "no access token: set GITHUB_TOKEN or the github-token input".to_string(),
                ));
            }
        }

        let branch_prefix = overrides
            .branch_prefix
            .or_else(|| var("INPUT_BRANCH-PREFIX"))
            .or_else(|| var("INPUT_BRANCH_PREFIX"))
            .unwrap_or_default();

        let api_url = overrides
            .api_url
            .or_else(|| var("GITHUB_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let call_timeout = match overrides.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_CALL_TIMEOUT),
        };

        Ok(Self {
            event_path,
            repo,
            token,
            flow: FlowConfig { branch_prefix },
            api_url,
            call_timeout,
            dry_run: overrides.dry_run,
        })
    }

    /// Repository and token, which every non-dry run has
    pub fn remote(&self) -> Result<(&RepoConfig, &str)> {
        match (&self.repo, &self.token) {
            (Some(repo), Some(token)) => Ok((repo, token)),
            _ => Err(Error::Config(
                "repository and access token are required".to_string(),
            )),
        }
    }
}
