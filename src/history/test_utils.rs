//! Shared test utilities for the `history` module.

use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};

use crate::store::{HistoryStore, Record, RecordId, RewriteSummary, TimestampPlan};

/// In-memory history store that records every call it receives.
///
/// Records are kept in creation order, which is also chronological order for
/// the histories the tests build.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) records: Vec<Record>,
    pub(crate) log: Vec<String>,
    pub(crate) local_changes: bool,
    pub(crate) stashed: usize,
    pub(crate) restore_points: Vec<String>,
    pub(crate) calls: Vec<&'static str>,
    /// Operations that fail when called.
    pub(crate) fail_on: Vec<&'static str>,
    /// Fails `append_record` once this many records have been appended.
    pub(crate) fail_append_after: Option<usize>,
}

impl MemoryStore {
    /// A store holding one record per timestamp, oldest first.
    pub(crate) fn with_records(timestamps: &[DateTime<Local>]) -> Self {
        let mut store = Self::default();
        for (i, timestamp) in timestamps.iter().enumerate() {
            let timestamp = timestamp.fixed_offset();
            store.records.push(Record {
                id: RecordId(format!("{i:040x}")),
                timestamp,
                authored: timestamp,
                label: format!("record {i}"),
            });
        }
        store
    }

    fn enter(&mut self, call: &'static str) -> Result<()> {
        self.calls.push(call);
        if self.fail_on.contains(&call) {
            bail!("{call} failed");
        }
        Ok(())
    }

    fn local(timestamp: NaiveDateTime) -> DateTime<FixedOffset> {
        Local
            .from_local_datetime(&timestamp)
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&timestamp))
            .fixed_offset()
    }
}

impl HistoryStore for MemoryStore {
    fn has_local_changes(&self) -> Result<bool> {
        Ok(self.local_changes)
    }

    fn stash_local_changes(&mut self, _message: &str) -> Result<()> {
        self.enter("stash")?;
        self.local_changes = false;
        self.stashed += 1;
        Ok(())
    }

    fn restore_local_changes(&mut self) -> Result<()> {
        self.enter("restore")?;
        if self.stashed == 0 {
            bail!("no stash entries");
        }
        self.stashed -= 1;
        self.local_changes = true;
        Ok(())
    }

    fn list_records_since(&self, cutoff: DateTime<Local>) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.timestamp.timestamp() >= cutoff.timestamp())
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    fn boundary_before(&self, cutoff: DateTime<Local>) -> Result<Option<RecordId>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.timestamp.timestamp() < cutoff.timestamp())
            .max_by_key(|r| r.timestamp)
            .map(|r| r.id.clone()))
    }

    fn append_record(
        &mut self,
        content: &str,
        timestamp: NaiveDateTime,
        label: &str,
    ) -> Result<RecordId> {
        self.enter("append")?;
        if self.fail_append_after == Some(self.records.len()) {
            bail!("append failed");
        }

        let id = RecordId(format!("{:040x}", self.records.len()));
        let timestamp = Self::local(timestamp);
        self.log.push(content.to_string());
        self.records.push(Record {
            id: id.clone(),
            timestamp,
            authored: timestamp,
            label: label.to_string(),
        });
        Ok(id)
    }

    fn create_restore_point(&mut self, label: &str) -> Result<()> {
        self.enter("restore_point")?;
        self.restore_points.push(label.to_string());
        Ok(())
    }

    fn rewrite_timestamps(
        &mut self,
        boundary: Option<&RecordId>,
        plan: &TimestampPlan,
    ) -> Result<RewriteSummary> {
        self.enter("rewrite")?;

        let first = match boundary {
            Some(boundary) => match self.records.iter().position(|r| &r.id == boundary) {
                Some(index) => index + 1,
                None => bail!("unknown boundary {boundary}"),
            },
            None => 0,
        };

        let mut summary = RewriteSummary {
            visited: self.records.len(),
            ..RewriteSummary::default()
        };
        for (position, record) in self.records[first..].iter_mut().enumerate() {
            if let Some(timestamp) = plan.timestamp_at(position) {
                let timestamp = Self::local(timestamp);
                record.timestamp = timestamp;
                record.authored = timestamp;
                summary.retimed += 1;
            }
        }
        Ok(summary)
    }
}
