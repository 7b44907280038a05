//! Data transfer objects shared by the routes, the store and the resolver.
//!
//! - `booking`: Booking, NewBooking
//! - `commit`: CommitRef, CommitPage, CommitRecord, FilePatch (history provider data)
//! - `blame`: BlameQuery, BlameMatch, BlameResponse for line attribution

pub mod blame;
pub mod booking;
pub mod commit;

pub use blame::*;
pub use booking::*;
pub use commit::*;
