//! GitHub REST history provider.
//!
//! - GET /repos/{owner}/{repo}/commits?path=&per_page=&page=
//!   Commits touching a path, newest first. The `Link` header carries the
//!   next page.
//! - GET /repos/{owner}/{repo}/commits/{sha}
//!   Author login plus one patch per changed file.
//!
//! The token comes from configuration (usually `GITHUB_TOKEN`) and is only
//! ever sent as a bearer header.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

use crate::history::{HistoryProvider, ProviderError};
use crate::models::{CommitPage, CommitRecord, CommitRef, FilePatch};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Commits per page when listing history
    pub per_page: u32,
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            per_page: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct GitHubProvider {
    client: Client,
    api_url: Url,
    token: Option<String>,
    per_page: u32,
    timeout: Duration,
}

impl GitHubProvider {
    pub fn new(config: GitHubConfig) -> Result<Self, ProviderError> {
        let api_url = Url::parse(&config.api_url).map_err(|e| {
            ProviderError::Transport(format!("invalid API url {}: {}", config.api_url, e))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let token = config.token.filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(
                "No GitHub token configured; requests are unauthenticated and heavily rate limited"
            );
        }

        Ok(Self {
            client,
            api_url,
            token,
            per_page: config.per_page.clamp(1, 100),
            timeout: config.timeout,
        })
    }

    fn commits_url(&self, owner: &str, repo: &str) -> Result<Url, ProviderError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| self.cannot_be_base())?
            .pop_if_empty()
            .extend(["repos", owner, repo, "commits"]);
        Ok(url)
    }

    fn cannot_be_base(&self) -> ProviderError {
        ProviderError::Transport(format!("API url cannot be a base: {}", self.api_url))
    }

    fn request(&self, url: Url) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        check_status(response).await
    }
}

#[async_trait]
impl HistoryProvider for GitHubProvider {
    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        page: u32,
    ) -> Result<CommitPage, ProviderError> {
        let mut url = self.commits_url(owner, repo)?;
        url.query_pairs_mut()
            .append_pair("path", path)
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());

        tracing::debug!(owner, repo, path, page, "Listing commits from GitHub");
        let response = self.send(self.request(url)).await?;

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_from_link);

        let listed: Vec<ListedCommit> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(CommitPage {
            commits: listed.into_iter().map(|c| CommitRef { id: c.sha }).collect(),
            next_page,
        })
    }

    async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        commit_id: &str,
    ) -> Result<CommitRecord, ProviderError> {
        let mut url = self.commits_url(owner, repo)?;
        url.path_segments_mut()
            .map_err(|_| self.cannot_be_base())?
            .push(commit_id);

        tracing::debug!(owner, repo, commit = commit_id, "Fetching commit from GitHub");
        let response = self.send(self.request(url)).await?;

        let detail: CommitDetail = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(detail.into())
    }

    fn name(&self) -> &'static str {
        "github"
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(classify_status(status, rate_exhausted, error_message(&body)))
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn classify_status(status: StatusCode, rate_exhausted: bool, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::Unauthorized(message),
        StatusCode::FORBIDDEN if rate_exhausted => ProviderError::RateLimited(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
        StatusCode::FORBIDDEN => ProviderError::Unauthorized(message),
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        _ => ProviderError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Page number of the `rel="next"` target in a `Link` header.
fn next_page_from_link(header: &str) -> Option<u32> {
    header.split(',').find_map(|link| {
        let (target, params) = link.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }

        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[derive(Debug, Deserialize)]
struct ListedCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    sha: String,
    /// Linked GitHub account; null when the commit email matches no account
    author: Option<Account>,
    commit: GitCommit,
    files: Option<Vec<ChangedFile>>,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    author: Option<GitSignature>,
}

#[derive(Debug, Deserialize)]
struct GitSignature {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
    patch: Option<String>,
}

impl From<CommitDetail> for CommitRecord {
    fn from(detail: CommitDetail) -> Self {
        let (author_name, authored_at) = match detail.commit.author {
            Some(sig) => (sig.name, sig.date),
            None => (None, None),
        };

        CommitRecord {
            id: detail.sha,
            author: detail.author.and_then(|a| a.login).filter(|l| !l.is_empty()),
            author_name,
            authored_at,
            files: detail
                .files
                .unwrap_or_default()
                .into_iter()
                .map(|f| FilePatch {
                    path: f.filename,
                    patch: f.patch,
                })
                .collect(),
        }
    }
}
