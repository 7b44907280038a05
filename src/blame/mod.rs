//! Line attribution from commit patches.
//!
//! - `hunk`: Parses `@@ -a,b +c,d @@` headers into destination ranges
//! - `resolver`: Walks a file's history newest first and returns the author
//!   of the first commit whose patch covers the requested line

pub mod hunk;
pub mod resolver;

pub use hunk::{HunkRange, patch_covers_line};
pub use resolver::{BlameError, BlameResolver, ResolverOptions};
