//! Blame data transfer objects.
//!
//! Attributes a single line of a file to the newest commit whose patch
//! covers it. Used by the author endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::blame::HunkRange;

/// Which line of which file to attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameQuery {
    pub owner: String,
    pub repo: String,
    pub path: String,
    /// 1-indexed; anything below 1 is rejected before any provider call
    pub line: i64,
}

/// Positive outcome of a blame lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameMatch {
    pub commit_id: String,
    pub author: String,
    pub author_name: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub path: String,
    pub line: u32,
    pub hunk: HunkRange,
}

/// Response for the author endpoint.
#[derive(Debug, Serialize)]
pub struct BlameResponse {
    /// Login (or signature name) of the author who last touched the line
    pub author: String,
    pub author_name: Option<String>,
    /// Commit whose patch covers the line
    pub commit: String,
    pub path: String,
    pub line: u32,
    pub hunk: HunkRange,
    pub authored_at: Option<DateTime<Utc>>,
    pub relative_time: Option<String>,
}

impl BlameResponse {
    pub fn from_match(found: BlameMatch, now: DateTime<Utc>) -> Self {
        let relative_time = found
            .authored_at
            .map(|at| format_relative_time(now.timestamp() - at.timestamp()));

        Self {
            author: found.author,
            author_name: found.author_name,
            commit: found.commit_id,
            path: found.path,
            line: found.line,
            hunk: found.hunk,
            authored_at: found.authored_at,
            relative_time,
        }
    }
}

/// Human readable age for a number of elapsed seconds.
pub fn format_relative_time(elapsed_secs: i64) -> String {
    let (amount, unit) = match elapsed_secs {
        d if d < 60 => return "just now".to_string(),
        d if d < 3600 => (d / 60, "minute"),
        d if d < 86400 => (d / 3600, "hour"),
        d if d < 2_592_000 => (d / 86400, "day"),
        d if d < 31_536_000 => (d / 2_592_000, "month"),
        d => (d / 31_536_000, "year"),
    };
    format!("{} {}{} ago", amount, unit, if amount == 1 { "" } else { "s" })
}
