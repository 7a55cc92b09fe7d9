//! Synthetic commit generation.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::Rng;
use tracing::debug;

use crate::config::GenerateConfig;
use crate::schedule::DateAssigner;
use crate::store::{HistoryStore, RecordId};

/// Per-day result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDay {
    /// The day commits were created for.
    pub date: NaiveDate,
    /// Records created on that day, in creation order.
    pub records: Vec<RecordId>,
}

/// Result of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Days in window order.
    pub days: Vec<GeneratedDay>,
}

impl GenerationSummary {
    /// Total number of records created.
    pub fn total(&self) -> usize {
        self.days.iter().map(|day| day.records.len()).sum()
    }
}

/// Creates a random number of commits on every day of a window.
pub struct Generator {
    config: GenerateConfig,
}

impl Generator {
    /// Creates a generator, validating `config`.
    pub fn new(config: GenerateConfig) -> Result<Self> {
        config
            .validate()
            .context("Invalid generate configuration")?;
        Ok(Self { config })
    }

    /// Runs the generation against `store`, stopping at the first failure.
    pub fn run<S, R>(&self, store: &mut S, rng: &mut R) -> Result<GenerationSummary>
    where
        S: HistoryStore + ?Sized,
        R: Rng,
    {
        let assigner = DateAssigner::new(self.config.window()?, self.config.hours()?);
        let mut summary = GenerationSummary::default();

        for date in assigner.window().dates() {
            let count =
                rng.random_range(self.config.min_per_day..=self.config.max_per_day) as usize;
            let mut records = Vec::with_capacity(count);

            for (i, timestamp) in assigner
                .times_for_day(date, count, rng)
                .into_iter()
                .enumerate()
            {
                let sequence = i + 1;
                let content = format!(
                    "Commit entry {} - {sequence}",
                    timestamp.format("%Y-%m-%dT%H:%M:%S")
                );
                let label = format!("Update log {} - {sequence}", date.format("%Y-%m-%d"));

                let id = store
                    .append_record(&content, timestamp, &label)
                    .with_context(|| format!("Failed to create commit '{label}'"))?;

                debug!(commit = %id.short(), %timestamp, "Generated commit");
                records.push(id);
            }

            println!(
                "Generated {} commits for {}",
                records.len(),
                date.format("%Y-%m-%d")
            );
            summary.days.push(GeneratedDay { date, records });
        }

        Ok(summary)
    }
}
