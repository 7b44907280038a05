//! Commit data as returned by a history provider.
//!
//! Produced once per provider call and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Enough of a commit to fetch its detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub id: String,
}

/// One page of commits touching a file, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitPage {
    pub commits: Vec<CommitRef>,
    /// Page number to request next, if the provider reports more history
    pub next_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    /// Author identity (forge login, or the signature name for local repositories)
    pub author: Option<String>,
    pub author_name: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub files: Vec<FilePatch>,
}

impl CommitRecord {
    /// Patch entry whose path is exactly `path`.
    pub fn file(&self, path: &str) -> Option<&FilePatch> {
        self.files.iter().find(|f| f.path == path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    pub path: String,
    /// `None` when no textual diff exists (binary files, pure renames)
    pub patch: Option<String>,
}
