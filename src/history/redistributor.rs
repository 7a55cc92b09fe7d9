//! Even redistribution of recent commits across a target window.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RedistributeConfig;
use crate::error::ChronoError;
use crate::history::report::Distribution;
use crate::schedule::{daily_counts, DateAssigner, Window};
use crate::store::{
    HistoryStore, RecordId, RewriteSummary, TimestampPlan, RESTORE_POINT_PREFIX,
};

/// Message attached to changes set aside before a rewrite.
pub const STASH_MESSAGE: &str = "Auto-stash before commit redistribution";

/// What a redistribution run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedistributionOutcome {
    /// No commits were found after the cutoff; nothing was touched.
    NothingToDo,
    /// Commits were rewritten.
    Redistributed(RedistributionReport),
}

/// Details of a completed redistribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedistributionReport {
    /// Number of commits redistributed.
    pub total: usize,
    /// Planned commits per target day, in window order.
    pub planned_per_day: Vec<usize>,
    /// Branch holding the pre-rewrite state.
    pub restore_point: String,
    /// Last commit before the redistributed range.
    pub boundary: Option<RecordId>,
    /// Rewrite statistics.
    pub rewrite: RewriteSummary,
    /// Commits per day after the rewrite.
    pub distribution: Distribution,
    /// Whether local changes were stashed and restored around the rewrite.
    pub stashed: bool,
}

/// Spreads the commits of a recent period evenly across a target window.
pub struct Redistributor {
    config: RedistributeConfig,
}

impl Redistributor {
    /// Creates a redistributor.
    pub fn new(config: RedistributeConfig) -> Self {
        Self { config }
    }

    /// The oldest commit time that is still redistributed for a run at `now`.
    pub fn cutoff(&self, now: DateTime<Local>) -> Result<DateTime<Local>, ChronoError> {
        self.config.cutoff(now)
    }

    /// Runs the redistribution at time `now`.
    ///
    /// Local changes are stashed first and restored afterwards on both the
    /// success and the failure path. A failed restore after a failed rewrite is
    /// logged and the rewrite error is returned.
    pub fn run<S, R>(
        &self,
        store: &mut S,
        rng: &mut R,
        now: DateTime<Local>,
    ) -> Result<RedistributionOutcome>
    where
        S: HistoryStore + ?Sized,
        R: Rng,
    {
        self.config
            .validate(now)
            .context("Invalid redistribute configuration")?;

        let stashed = if store.has_local_changes()? {
            println!("Warning: You have uncommitted changes.");
            println!("Stashing changes before redistribution...");
            store
                .stash_local_changes(STASH_MESSAGE)
                .context("Failed to stash local changes")?;
            true
        } else {
            false
        };

        let result = self.redistribute(store, rng, now, stashed);

        if stashed {
            println!("Restoring stashed changes...");
            match (store.restore_local_changes(), &result) {
                (Ok(()), _) => {}
                (Err(e), Ok(_)) => return Err(e),
                (Err(e), Err(_)) => {
                    warn!("Failed to restore stashed changes: {e:#}");
                    eprintln!("Warning: stashed changes were not restored; run `git stash pop`");
                }
            }
        }

        result
    }

    fn redistribute<S, R>(
        &self,
        store: &mut S,
        rng: &mut R,
        now: DateTime<Local>,
        stashed: bool,
    ) -> Result<RedistributionOutcome>
    where
        S: HistoryStore + ?Sized,
        R: Rng,
    {
        let cutoff = self.cutoff(now)?;
        let window = self.config.target_window(now.date_naive())?;

        println!(
            "Collecting commits from the past {} days...",
            self.config.lookback_days
        );
        let records = store
            .list_records_since(cutoff)
            .context("Failed to list commits to redistribute")?;
        let total = records.len();

        if total == 0 {
            println!(
                "No commits found in the past {} days.",
                self.config.lookback_days
            );
            return Ok(RedistributionOutcome::NothingToDo);
        }

        let planned_per_day = daily_counts(total, window.days());
        println!("Total commits to redistribute: {total}");
        println!("Commits per day: {}", total / window.days() as usize);
        println!(
            "Extra commits to distribute: {}",
            total % window.days() as usize
        );

        let restore_point = format!("{RESTORE_POINT_PREFIX}{}", now.format("%Y%m%d-%H%M%S"));
        println!("Creating backup branch: {restore_point}");
        store
            .create_restore_point(&restore_point)
            .context("Failed to create restore point")?;

        let boundary = store
            .boundary_before(cutoff)
            .context("Failed to find the commit before the redistributed range")?;
        match &boundary {
            Some(id) => println!("Base commit (before range): {}...", id.short()),
            None => println!("Base commit (before range): none, starting at the root"),
        }

        let assigner = DateAssigner::new(window, self.config.hours()?);
        let plan = TimestampPlan::new(assigner.assign(total, rng));
        info!(
            total,
            start = %window.start(),
            end = %window.end(),
            "Computed target timestamps"
        );

        println!("Redistributing commits...");
        let rewrite = store
            .rewrite_timestamps(boundary.as_ref(), &plan)
            .context("Failed to rewrite commit timestamps")?;

        let report_since = cutoff.min(start_of_day(window));
        let distribution = Distribution::from_records(
            &store
                .list_records_since(report_since)
                .context("Failed to list redistributed commits")?,
        );

        Ok(RedistributionOutcome::Redistributed(RedistributionReport {
            total,
            planned_per_day,
            restore_point,
            boundary,
            rewrite,
            distribution,
            stashed,
        }))
    }
}

/// Local midnight at the start of `window`, or the earliest valid instant that day.
fn start_of_day(window: Window) -> DateTime<Local> {
    let midnight = window.start().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::history::test_utils::MemoryStore;
    use chrono::{Duration, NaiveDate, Timelike};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 11, 27, 12, 0, 0).earliest().unwrap()
    }

    fn config() -> RedistributeConfig {
        RedistributeConfig {
            target_start: NaiveDate::from_ymd_opt(2025, 11, 14),
            ..RedistributeConfig::default()
        }
    }

    /// `count` records an hour apart, the newest a day before `now()`.
    fn recent_records(count: usize) -> Vec<DateTime<Local>> {
        let newest = now() - Duration::days(1);
        (0..count)
            .rev()
            .map(|i| newest - Duration::hours(i as i64))
            .collect()
    }

    fn run(store: &mut MemoryStore) -> Result<RedistributionOutcome> {
        Redistributor::new(config()).run(store, &mut StdRng::seed_from_u64(9), now())
    }

    fn report(outcome: RedistributionOutcome) -> RedistributionReport {
        match outcome {
            RedistributionOutcome::Redistributed(report) => report,
            RedistributionOutcome::NothingToDo => panic!("expected a redistribution"),
        }
    }

    #[test]
    fn nothing_to_do_without_recent_records() {
        let old = now() - Duration::days(30);
        let mut store = MemoryStore::with_records(&[old]);

        let outcome = run(&mut store).unwrap();

        assert_eq!(outcome, RedistributionOutcome::NothingToDo);
        assert!(store.restore_points.is_empty());
        assert!(!store.calls.contains(&"rewrite"));
        assert_eq!(store.records[0].timestamp, old.fixed_offset());
    }

    #[test]
    fn one_record_per_day() {
        let mut store = MemoryStore::with_records(&recent_records(14));

        let report = report(run(&mut store).unwrap());

        assert_eq!(report.total, 14);
        assert_eq!(report.planned_per_day, vec![1; 14]);
        let window = config().target_window(now().date_naive()).unwrap();
        for (record, day) in store.records.iter().zip(window.dates()) {
            assert_eq!(record.timestamp.naive_local().date(), day);
        }
    }

    #[test]
    fn remainder_days_come_first() {
        let mut store = MemoryStore::with_records(&recent_records(17));

        let report = report(run(&mut store).unwrap());

        let window = config().target_window(now().date_naive()).unwrap();
        for (i, day) in window.dates().enumerate() {
            let expected = if i < 3 { 2 } else { 1 };
            assert_eq!(report.distribution.count_on(day), expected, "{day}");
        }
        assert_eq!(report.distribution.total(), 17);

        for record in &store.records {
            let hour = record.timestamp.naive_local().hour();
            assert!((9..=17).contains(&hour));
        }
    }

    #[test]
    fn records_before_the_boundary_are_untouched() {
        let old = now() - Duration::days(20);
        let mut timestamps = vec![old];
        timestamps.extend(recent_records(4));
        let mut store = MemoryStore::with_records(&timestamps);
        let boundary = store.records[0].id.clone();

        let report = report(run(&mut store).unwrap());

        assert_eq!(report.boundary, Some(boundary));
        assert_eq!(report.rewrite.retimed, 4);
        assert_eq!(store.records[0].timestamp, old.fixed_offset());
        let days: Vec<NaiveDate> = store.records[1..]
            .iter()
            .map(|r| r.timestamp.naive_local().date())
            .collect();
        assert!(days.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn restore_point_is_labeled_with_run_time() {
        let mut store = MemoryStore::with_records(&recent_records(3));

        let report = report(run(&mut store).unwrap());

        assert_eq!(
            store.restore_points,
            vec!["backup-before-redistribute-20251127-120000".to_string()]
        );
        assert_eq!(report.restore_point, store.restore_points[0]);
        let restore_at = store.calls.iter().position(|c| *c == "restore_point");
        let rewrite_at = store.calls.iter().position(|c| *c == "rewrite");
        assert!(restore_at < rewrite_at);
    }

    #[test]
    fn local_changes_restored_after_success() {
        let mut store = MemoryStore::with_records(&recent_records(5));
        store.local_changes = true;

        let report = report(run(&mut store).unwrap());

        assert!(report.stashed);
        assert_eq!(store.calls.first(), Some(&"stash"));
        assert_eq!(store.calls.last(), Some(&"restore"));
        assert!(store.local_changes);
        assert_eq!(store.stashed, 0);
    }

    #[test]
    fn local_changes_restored_when_nothing_to_do() {
        let mut store = MemoryStore::default();
        store.local_changes = true;

        assert_eq!(run(&mut store).unwrap(), RedistributionOutcome::NothingToDo);
        assert_eq!(store.calls, vec!["stash", "restore"]);
        assert!(store.local_changes);
    }

    #[test]
    fn local_changes_restored_after_failure() {
        let mut store = MemoryStore::with_records(&recent_records(5));
        store.local_changes = true;
        store.fail_on = vec!["rewrite"];

        let err = run(&mut store).unwrap_err();

        assert!(format!("{err:#}").contains("rewrite failed"));
        assert_eq!(store.calls.last(), Some(&"restore"));
        assert!(store.local_changes);
    }

    #[test]
    fn failed_restore_keeps_original_error() {
        let mut store = MemoryStore::with_records(&recent_records(5));
        store.local_changes = true;
        store.fail_on = vec!["rewrite", "restore"];

        let err = run(&mut store).unwrap_err();

        assert!(format!("{err:#}").contains("rewrite failed"));
    }

    #[test]
    fn failed_restore_after_success_is_reported() {
        let mut store = MemoryStore::with_records(&recent_records(5));
        store.local_changes = true;
        store.fail_on = vec!["restore"];

        let err = run(&mut store).unwrap_err();

        assert!(format!("{err:#}").contains("restore failed"));
    }

    #[test]
    fn clean_store_is_never_stashed() {
        let mut store = MemoryStore::with_records(&recent_records(2));

        report(run(&mut store).unwrap());

        assert!(!store.calls.contains(&"stash"));
        assert!(!store.calls.contains(&"restore"));
    }

    #[test]
    fn cutoff_is_lookback_before_now() {
        let redistributor = Redistributor::new(RedistributeConfig::default());
        let now = Local::now();
        assert_eq!(now - redistributor.cutoff(now).unwrap(), Duration::days(14));
    }

    #[test]
    fn oversized_lookback_is_rejected_before_touching_the_store() {
        let mut store = MemoryStore::with_records(&recent_records(3));
        store.local_changes = true;
        let redistributor = Redistributor::new(RedistributeConfig {
            lookback_days: u32::MAX,
            ..config()
        });

        let err = redistributor
            .run(&mut store, &mut StdRng::seed_from_u64(9), now())
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ChronoError>(),
            Some(&ChronoError::LookbackOutOfRange { days: u32::MAX })
        );
        assert!(store.calls.is_empty());
    }

    #[test]
    fn start_of_day_is_midnight() {
        let window = Window::new(NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(), 14).unwrap();
        let start = start_of_day(window);
        assert_eq!(start.date_naive(), window.start());
    }
}
