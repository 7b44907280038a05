//! History providers - where commit lists and patches come from.
//!
//! - `github`: GitHub REST API (`/repos/{owner}/{repo}/commits`)
//! - `local`: A git repository on disk, read through libgit2
//!
//! The blame resolver only sees the `HistoryProvider` trait.

pub mod github;
pub mod local;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CommitPage, CommitRecord};

pub use github::GitHubProvider;
pub use local::LocalGitProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Source of commit history for a single file.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Commits touching `path`, newest first. Pages start at 1.
    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        page: u32,
    ) -> Result<CommitPage, ProviderError>;

    /// Author and per-file patches of one commit.
    async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        commit_id: &str,
    ) -> Result<CommitRecord, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

pub type SharedProvider = Arc<dyn HistoryProvider>;
