//! Commit blame resolution.
//!
//! Answers "who most recently touched line L of file F": commits are scanned
//! newest first and the first one whose patch for F has a hunk covering L
//! wins. Older commits are never fetched once a match is found.
//!
//! Only `max_pages` pages of history are read (1 by default, the same as a
//! single `ListCommits` call). Every provider call is bounded by
//! `call_timeout` and can be cancelled through a `CancellationToken`.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::blame::patch_covers_line;
use crate::history::{ProviderError, SharedProvider};
use crate::models::{BlameMatch, BlameQuery, CommitRecord};

#[derive(Error, Debug)]
pub enum BlameError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("No commit found for file {path} at line {line}")]
    NotFound { path: String, line: u32 },

    #[error("Lookup failed during {operation}: {source}")]
    LookupFailed {
        operation: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Malformed data for commit {commit}: {reason}")]
    MalformedData { commit: String, reason: String },

    #[error("Lookup cancelled during {operation}")]
    Cancelled { operation: &'static str },
}

impl BlameError {
    /// Whether the lookup itself failed, as opposed to a bad query or a
    /// negative answer.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            BlameError::LookupFailed { .. }
                | BlameError::MalformedData { .. }
                | BlameError::Cancelled { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Upper bound on pages of history to scan
    pub max_pages: u32,
    /// Deadline for each individual provider call
    pub call_timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_pages: 1,
            call_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct BlameResolver {
    provider: SharedProvider,
    options: ResolverOptions,
}

impl BlameResolver {
    pub fn new(provider: SharedProvider, options: ResolverOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn resolve(&self, query: &BlameQuery) -> Result<BlameMatch, BlameError> {
        self.resolve_with_cancel(query, &CancellationToken::new()).await
    }

    pub async fn resolve_with_cancel(
        &self,
        query: &BlameQuery,
        cancel: &CancellationToken,
    ) -> Result<BlameMatch, BlameError> {
        let line = validate(query)?;
        let BlameQuery { owner, repo, path, .. } = query;

        tracing::info!(
            provider = self.provider.name(),
            %owner,
            %repo,
            %path,
            line,
            "Resolving blame"
        );

        let mut page = 1;
        for pages_read in 1..=self.options.max_pages.max(1) {
            let listing = self
                .call(
                    "list_commits",
                    cancel,
                    self.provider.list_commits(owner, repo, path, page),
                )
                .await?;

            tracing::debug!(page, commits = listing.commits.len(), "Scanning commit page");

            for commit_ref in &listing.commits {
                let record = self
                    .call(
                        "get_commit",
                        cancel,
                        self.provider.get_commit(owner, repo, &commit_ref.id),
                    )
                    .await?;

                if let Some(found) = match_commit(record, path, line)? {
                    tracing::info!(
                        commit = %found.commit_id,
                        author = %found.author,
                        "Blame resolved"
                    );
                    return Ok(found);
                }
            }

            match listing.next_page {
                Some(next) if pages_read < self.options.max_pages => page = next,
                Some(_) => {
                    tracing::debug!(
                        max_pages = self.options.max_pages,
                        "Page limit reached with history remaining"
                    );
                    break;
                }
                None => break,
            }
        }

        Err(BlameError::NotFound {
            path: path.clone(),
            line,
        })
    }

    /// Await one provider call under the per-call deadline and the token.
    async fn call<T>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, BlameError> {
        let timeout = self.options.call_timeout;

        tokio::select! {
            _ = cancel.cancelled() => Err(BlameError::Cancelled { operation }),
            result = tokio::time::timeout(timeout, fut) => match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(BlameError::LookupFailed { operation, source }),
                Err(_) => Err(BlameError::LookupFailed {
                    operation,
                    source: ProviderError::Timeout(timeout),
                }),
            },
        }
    }
}

fn validate(query: &BlameQuery) -> Result<u32, BlameError> {
    if query.owner.trim().is_empty() || query.repo.trim().is_empty() {
        return Err(BlameError::InvalidQuery("owner and repo are required".to_string()));
    }
    if query.path.is_empty() {
        return Err(BlameError::InvalidQuery("path is required".to_string()));
    }
    if query.line < 1 {
        return Err(BlameError::InvalidQuery(format!(
            "line must be at least 1, got {}",
            query.line
        )));
    }

    u32::try_from(query.line)
        .map_err(|_| BlameError::InvalidQuery(format!("line {} is out of range", query.line)))
}

/// Attribute `line` to `record` if its patch for `path` covers it.
fn match_commit(
    record: CommitRecord,
    path: &str,
    line: u32,
) -> Result<Option<BlameMatch>, BlameError> {
    let hunk = match record.file(path).and_then(|f| f.patch.as_deref()) {
        Some(patch) => patch_covers_line(patch, line),
        None => None,
    };

    let Some(hunk) = hunk else {
        return Ok(None);
    };

    let author = record.author.ok_or_else(|| BlameError::MalformedData {
        commit: record.id.clone(),
        reason: "commit has no author".to_string(),
    })?;

    Ok(Some(BlameMatch {
        commit_id: record.id,
        author,
        author_name: record.author_name,
        authored_at: record.authored_at,
        path: path.to_string(),
        line,
        hunk,
    }))
}
