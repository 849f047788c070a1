//! GitHub repository gateway implementation

use crate::error::{Error, Result};
use crate::platform::RepositoryGateway;
use crate::types::{Branch, MergeMethod, MergeStatus, PullRequest, RefDeletion, RepoConfig};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::repos::Object;
use octocrab::params::repos::Reference;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Public GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

// GraphQL response types for the auto-merge protocol

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct PullRequestIdData {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    pull_request: Option<NodeId>,
}

#[derive(Deserialize)]
struct NodeId {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnableAutoMergeData {
    enable_pull_request_auto_merge: Option<EnableAutoMergePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnableAutoMergePayload {
    pull_request: Option<AutoMergePullRequest>,
}

#[derive(Deserialize)]
struct AutoMergePullRequest {
    number: u64,
}

/// Unwrap a GraphQL response, turning reported errors into `Error::GitHubApi`
fn graphql_data<T>(response: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(Error::GitHubApi(format!(
            "GraphQL error: {}",
            messages.join(", ")
        )));
    }

    response
        .data
        .ok_or_else(|| Error::GitHubApi("No data in GraphQL response".to_string()))
}

/// Percent-encode a branch name for a URL path, keeping `/` separators
fn encode_branch_path(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Body of an error response, for the error message
async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_else(|e| {
        debug!(error = %e, "failed to read error response body");
        String::new()
    })
}

/// HTTP status of an octocrab API error, if GitHub answered at all
fn api_status(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
    }
}

/// GitHub gateway using octocrab, with raw requests where the REST
/// endpoints answer with status codes octocrab treats as errors
pub struct GitHubGateway {
    client: Octocrab,
    config: RepoConfig,
    /// Token for raw HTTP requests (merges, ref deletion)
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// REST base URL without trailing slash
    api_url: String,
}

impl GitHubGateway {
    /// Create a new GitHub gateway
    ///
    /// `api_url` is the REST base, [`DEFAULT_API_URL`] for github.com or
    /// `https://<host>/api/v3` for GitHub Enterprise.
    pub fn new(token: &str, config: RepoConfig, api_url: &str) -> Result<Self> {
        let api_url = api_url.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_url.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("merge-down")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            token: token.to_string(),
            http_client,
            api_url,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{path}",
            self.api_url, self.config.owner, self.config.repo
        )
    }

    fn raw(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[async_trait]
impl RepositoryGateway for GitHubGateway {
    async fn delete_ref(&self, branch: &str) -> Result<RefDeletion> {
        debug!(branch, "deleting ref");
        let url = self.repo_url(&format!("git/refs/heads/{}", encode_branch_path(branch)));

        let response = self
            .raw(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to delete ref: {e}")))?;

        match response.status() {
            status if status.is_success() => {
                debug!(branch, "deleted ref");
                Ok(RefDeletion::Deleted)
            }
            // GitHub answers 422 "Reference does not exist" for missing refs
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                debug!(branch, "ref not found");
                Ok(RefDeletion::NotFound)
            }
            status => {
                let body = error_body(response).await;
                Err(Error::GitHubApi(format!(
                    "Deleting ref {branch} returned {status}: {body}"
                )))
            }
        }
    }

    async fn get_branch(&self, name: &str) -> Result<Option<Branch>> {
        debug!(name, "looking up branch");
        let reference = match self
            .client
            .repos(&self.config.owner, &self.config.repo)
            .get_ref(&Reference::Branch(name.to_string()))
            .await
        {
            Ok(reference) => reference,
            Err(e) if api_status(&e) == Some(404) => {
                debug!(name, "branch not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let sha = match reference.object {
            Object::Commit { sha, .. } => sha,
            _ => {
                return Err(Error::GitHubApi(format!(
                    "Branch {name} does not point at a commit"
                )));
            }
        };

        debug!(name, sha = %sha, "found branch");
        Ok(Some(Branch {
            name: name.to_string(),
            sha,
        }))
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()> {
        debug!(branch, sha, "creating ref");
        match self
            .client
            .repos(&self.config.owner, &self.config.repo)
            .create_ref(&Reference::Branch(branch.to_string()), sha)
            .await
        {
            Ok(_) => {
                debug!(branch, "created ref");
                Ok(())
            }
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == 422
                    && source.message.contains("already exists") =>
            {
                Err(Error::RefAlreadyExists(branch.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn merge(&self, base: &str, head: &str) -> Result<MergeStatus> {
        debug!(base, head, "merging");
        let url = self.repo_url("merges");

        let response = self
            .raw(reqwest::Method::POST, &url)
            .json(&serde_json::json!({
                "base": base,
                "head": head,
                "commit_message": format!("Merge branch '{head}' into {base}"),
            }))
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to merge: {e}")))?;

        let status = match response.status() {
            StatusCode::CREATED => MergeStatus::Merged,
            StatusCode::NO_CONTENT => MergeStatus::UpToDate,
            StatusCode::CONFLICT => MergeStatus::Conflict,
            status => {
                let body = error_body(response).await;
                return Err(Error::GitHubApi(format!(
                    "Merging {head} into {base} returned {status}: {body}"
                )));
            }
        };

        debug!(base, head, status = ?status, "merge complete");
        Ok(status)
    }

    async fn create_pull_request(
        &self,
        title: &str,
        base: &str,
        head: &str,
        body: &str,
    ) -> Result<PullRequest> {
        debug!(head, base, "creating PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .create(title, head, base)
            .body(body)
            .send()
            .await?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn resolve_pull_request_id(&self, number: u64) -> Result<String> {
        debug!(number, "resolving PR node id");
        let response: GraphQlResponse<PullRequestIdData> = self
            .client
            .graphql(&serde_json::json!({
                "query": r"
                    query PullRequestId($owner: String!, $repo: String!, $number: Int!) {
                        repository(owner: $owner, name: $repo) {
                            pullRequest(number: $number) {
                                id
                            }
                        }
                    }
                ",
                "variables": {
                    "owner": self.config.owner,
                    "repo": self.config.repo,
                    "number": number,
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("GraphQL query failed: {e}")))?;

        let id = graphql_data(response)?
            .repository
            .and_then(|repo| repo.pull_request)
            .map(|pr| pr.id)
            .ok_or_else(|| Error::GitHubApi(format!("PR #{number} not found")))?;

        debug!(number, id = %id, "resolved PR node id");
        Ok(id)
    }

    async fn enable_auto_merge(&self, pull_request_id: &str, method: MergeMethod) -> Result<()> {
        debug!(pull_request_id, %method, "enabling auto-merge");
        let response: GraphQlResponse<EnableAutoMergeData> = self
            .client
            .graphql(&serde_json::json!({
                "query": r"
                    mutation EnableAutoMerge($pullRequestId: ID!, $mergeMethod: PullRequestMergeMethod!) {
                        enablePullRequestAutoMerge(input: { pullRequestId: $pullRequestId, mergeMethod: $mergeMethod }) {
                            pullRequest {
                                number
                            }
                        }
                    }
                ",
                "variables": {
                    "pullRequestId": pull_request_id,
                    "mergeMethod": method.as_graphql(),
                }
            }))
            .await
            .map_err(|e| Error::GitHubApi(format!("GraphQL mutation failed: {e}")))?;

        let number = graphql_data(response)?
            .enable_pull_request_auto_merge
            .and_then(|payload| payload.pull_request)
            .map(|pr| pr.number)
            .ok_or_else(|| {
                Error::GitHubApi("Auto-merge mutation returned no pull request".to_string())
            })?;

        debug!(pr_number = number, "enabled auto-merge");
        Ok(())
    }

    async fn update_issue_assignees(&self, number: u64, logins: &[String]) -> Result<()> {
        debug!(number, ?logins, "adding assignees");
        let logins: Vec<&str> = logins.iter().map(String::as_str).collect();
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_assignees(number, &logins)
            .await?;
        debug!(number, "added assignees");
        Ok(())
    }
}
