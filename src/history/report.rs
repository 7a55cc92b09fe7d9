//! Per-day commit counts shown to the operator after a run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::store::Record;

/// Number of records per calendar day, ordered by day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    days: BTreeMap<NaiveDate, usize>,
}

impl Distribution {
    /// Counts records by the day they were authored on.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut days = BTreeMap::new();
        for record in records {
            *days.entry(record.authored.date_naive()).or_insert(0) += 1;
        }
        Self { days }
    }

    /// Records on `date`.
    pub fn count_on(&self, date: NaiveDate) -> usize {
        self.days.get(&date).copied().unwrap_or(0)
    }

    /// Records across all days.
    pub fn total(&self) -> usize {
        self.days.values().sum()
    }

    /// Iterates over `(day, count)` pairs in day order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, usize)> + '_ {
        self.days.iter().map(|(day, count)| (*day, *count))
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (day, count) in self.iter() {
            writeln!(f, "{count:>7} {day}")?;
        }
        Ok(())
    }
}
