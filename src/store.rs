//! The history store collaborator.
//!
//! Both drivers talk to the repository only through [`HistoryStore`], which
//! keeps them independent of git and testable against an in-memory double.

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use serde::Serialize;

use crate::schedule::DateAssignment;

/// Branch name prefix of restore points created before a rewrite.
pub const RESTORE_POINT_PREFIX: &str = "backup-before-redistribute-";

/// Opaque identifier of a record (a full commit hash for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId(pub String);

impl RecordId {
    /// Abbreviated form for display.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(crate::git::SHORT_HASH_LEN);
        &self.0[..end]
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single historical entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record identifier.
    pub id: RecordId,
    /// Timestamp used to order and select records.
    pub timestamp: DateTime<FixedOffset>,
    /// Author timestamp, reported back to the operator.
    pub authored: DateTime<FixedOffset>,
    /// One-line label.
    pub label: String,
}

/// Position-indexed target timestamps for a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampPlan {
    timestamps: Vec<NaiveDateTime>,
}

impl TimestampPlan {
    /// Builds a plan from assignments with contiguous positions `0..n`.
    pub fn new(mut assignments: Vec<DateAssignment>) -> Self {
        assignments.sort_by_key(|a| a.position);
        debug_assert!(assignments.iter().enumerate().all(|(i, a)| a.position == i));
        Self {
            timestamps: assignments.into_iter().map(|a| a.timestamp).collect(),
        }
    }

    /// Number of positions covered.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the plan assigns nothing.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Target timestamp for `position`, if it lies in `[0, len)`.
    pub fn timestamp_at(&self, position: usize) -> Option<NaiveDateTime> {
        self.timestamps.get(position).copied()
    }
}

/// Outcome of a timestamp rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    /// Records visited by the rewrite.
    pub visited: usize,
    /// Records whose timestamps were replaced.
    pub retimed: usize,
    /// References moved to rewritten records.
    pub refs_updated: usize,
}

/// Operations the drivers need from a version-controlled store.
pub trait HistoryStore {
    /// Whether the working copy has uncommitted modifications.
    fn has_local_changes(&self) -> Result<bool>;

    /// Sets uncommitted modifications aside.
    fn stash_local_changes(&mut self, message: &str) -> Result<()>;

    /// Restores the most recently stashed modifications.
    fn restore_local_changes(&mut self) -> Result<()>;

    /// Records with a timestamp at or after `cutoff`, oldest first.
    fn list_records_since(&self, cutoff: DateTime<Local>) -> Result<Vec<Record>>;

    /// The newest record strictly before `cutoff`, if any.
    fn boundary_before(&self, cutoff: DateTime<Local>) -> Result<Option<RecordId>>;

    /// Appends `content` to the log artifact and records it with `timestamp`.
    fn append_record(
        &mut self,
        content: &str,
        timestamp: NaiveDateTime,
        label: &str,
    ) -> Result<RecordId>;

    /// Creates a named restore point at the current state.
    fn create_restore_point(&mut self, label: &str) -> Result<()>;

    /// Retimes the records after `boundary` according to their position.
    ///
    /// `None` means no record precedes the window, so positions start at the root.
    fn rewrite_timestamps(
        &mut self,
        boundary: Option<&RecordId>,
        plan: &TimestampPlan,
    ) -> Result<RewriteSummary>;
}
