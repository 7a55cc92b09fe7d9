//! Git-backed history store.

pub mod repository;
pub mod rewrite;
mod time;

pub use repository::{FileStatus, GitRepository, WorkingDirectoryStatus};
pub use rewrite::TimestampRewriter;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Log message attached to references moved by a rewrite.
pub const REWRITE_REFLOG_MESSAGE: &str = "git-chrono: redistribute commit timestamps";
