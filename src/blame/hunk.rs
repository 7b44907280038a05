//! Unified-diff hunk header parsing.
//!
//! Only the header line (`@@ -a,b +c,d @@`) is understood. The resolver uses
//! the destination range `(c, d)` to decide whether a patch touched a line.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const HUNK_MARKER: &str = "@@";

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header regex is valid")
});

/// Destination line range of a single hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HunkRange {
    pub new_start: u32,
    pub new_count: u32,
}

impl HunkRange {
    /// Inclusive on both ends: `new_start <= line <= new_start + new_count`.
    pub fn covers(&self, line: u32) -> bool {
        let end = u64::from(self.new_start) + u64::from(self.new_count);
        self.new_start <= line && u64::from(line) <= end
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HunkParseError {
    #[error("not a hunk header")]
    NotHeader,

    #[error("malformed hunk header: {0}")]
    Malformed(String),
}

/// Parse one line of a patch as a hunk header.
///
/// An omitted count (`@@ -3 +4 @@`) means a single line, so `new_count` is 1.
pub fn parse_hunk_header(line: &str) -> Result<HunkRange, HunkParseError> {
    if !line.starts_with(HUNK_MARKER) {
        return Err(HunkParseError::NotHeader);
    }

    let malformed = || HunkParseError::Malformed(line.to_string());
    let caps = HUNK_HEADER.captures(line).ok_or_else(malformed)?;

    let new_start = caps[3].parse::<u32>().map_err(|_| malformed())?;
    let new_count = match caps.get(4) {
        Some(count) => count.as_str().parse::<u32>().map_err(|_| malformed())?,
        None => 1,
    };

    Ok(HunkRange {
        new_start,
        new_count,
    })
}

/// All parseable hunk ranges of a patch, in order. Malformed headers are skipped.
pub fn hunk_ranges(patch: &str) -> impl Iterator<Item = HunkRange> + '_ {
    patch.lines().filter_map(|line| match parse_hunk_header(line) {
        Ok(range) => Some(range),
        Err(HunkParseError::NotHeader) => None,
        Err(HunkParseError::Malformed(header)) => {
            tracing::debug!(%header, "Skipping malformed hunk header");
            None
        }
    })
}

/// First hunk of `patch` whose destination range covers `line`.
pub fn patch_covers_line(patch: &str, line: u32) -> Option<HunkRange> {
    hunk_ranges(patch).find(|range| range.covers(line))
}
