//! Date windows and timestamp assignment.
//!
//! A [`DateAssigner`] spreads a number of items over the days of a [`Window`]
//! and draws a random time of day for each of them.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

use crate::error::ChronoError;

/// A contiguous, inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: NaiveDate,
    days: u32,
}

impl Window {
    /// Creates a window of `days` days beginning at `start`.
    pub fn new(start: NaiveDate, days: u32) -> Result<Self, ChronoError> {
        if days == 0 {
            return Err(ChronoError::EmptyWindow);
        }

        start
            .checked_add_days(chrono::Days::new(u64::from(days - 1)))
            .ok_or(ChronoError::WindowOutOfRange { start, days })?;

        Ok(Self { start, days })
    }

    /// Creates the window of `days` days that ends on `end`, inclusive.
    pub fn ending_on(end: NaiveDate, days: u32) -> Result<Self, ChronoError> {
        if days == 0 {
            return Err(ChronoError::EmptyWindow);
        }

        let start = end
            .checked_sub_days(chrono::Days::new(u64::from(days - 1)))
            .ok_or(ChronoError::WindowOutOfRange { start: end, days })?;

        Self::new(start, days)
    }

    /// First day of the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Number of days covered.
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Last day of the window, inclusive.
    pub fn end(&self) -> NaiveDate {
        self.day(self.days - 1)
    }

    /// Returns the date at `offset` days from the start.
    fn day(&self, offset: u32) -> NaiveDate {
        self.start + Duration::days(i64::from(offset))
    }

    /// Iterates over every date in the window in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map(move |offset| self.day(offset))
    }

    /// Whether `date` lies inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }
}

/// Inclusive range of hours a generated time of day may fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    first: u32,
    last: u32,
}

impl HourRange {
    /// Working hours used when redistributing commits.
    pub const WORKDAY: Self = Self { first: 9, last: 17 };

    /// Hours used when generating synthetic commits.
    pub const EXTENDED: Self = Self { first: 9, last: 23 };

    /// Creates a validated hour range.
    pub fn new(first: u32, last: u32) -> Result<Self, ChronoError> {
        if first > last || last > 23 {
            return Err(ChronoError::InvalidHourRange { first, last });
        }
        Ok(Self { first, last })
    }

    /// First allowed hour.
    pub fn first(&self) -> u32 {
        self.first
    }

    /// Last allowed hour, inclusive.
    pub fn last(&self) -> u32 {
        self.last
    }
}

/// A target timestamp for the record at `position` in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateAssignment {
    /// Zero-based position of the record, oldest first.
    pub position: usize,
    /// Wall-clock timestamp the record should carry.
    pub timestamp: NaiveDateTime,
}

/// Splits `total` items over `days` days.
///
/// The first `total % days` days receive one item more than the rest.
pub fn daily_counts(total: usize, days: u32) -> Vec<usize> {
    let days = days as usize;
    if days == 0 {
        return Vec::new();
    }

    let base = total / days;
    let remainder = total % days;

    (0..days)
        .map(|day| if day < remainder { base + 1 } else { base })
        .collect()
}

/// Spreads items evenly across a window with random times of day.
#[derive(Debug, Clone, Copy)]
pub struct DateAssigner {
    window: Window,
    hours: HourRange,
}

impl DateAssigner {
    /// Creates an assigner for `window` drawing hours from `hours`.
    pub fn new(window: Window, hours: HourRange) -> Self {
        Self { window, hours }
    }

    /// The window items are assigned into.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Produces exactly `total` assignments with positions `0..total`.
    pub fn assign<R: Rng>(&self, total: usize, rng: &mut R) -> Vec<DateAssignment> {
        let counts = daily_counts(total, self.window.days());
        let mut assignments = Vec::with_capacity(total);

        for (date, count) in self.window.dates().zip(counts) {
            for timestamp in self.times_for_day(date, count, rng) {
                assignments.push(DateAssignment {
                    position: assignments.len(),
                    timestamp,
                });
            }
        }

        assignments
    }

    /// Draws `count` timestamps on `date`, in generation order.
    pub fn times_for_day<R: Rng>(
        &self,
        date: NaiveDate,
        count: usize,
        rng: &mut R,
    ) -> Vec<NaiveDateTime> {
        (0..count).map(|_| self.random_time(date, &mut *rng)).collect()
    }

    /// Draws a single timestamp on `date`.
    pub fn random_time<R: Rng>(&self, date: NaiveDate, rng: &mut R) -> NaiveDateTime {
        let hour = rng.random_range(self.hours.first()..=self.hours.last());
        let minute: u32 = rng.random_range(0..=59);
        let second: u32 = rng.random_range(0..=59);

        let offset = i64::from(hour * 3600 + minute * 60 + second);
        date.and_time(NaiveTime::MIN) + Duration::seconds(offset)
    }
}
