//! Conversions between git timestamps and chrono values.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone};
use git2::Time;

use crate::error::ChronoError;

/// Converts a git timestamp into a date-time in its recorded offset.
pub(crate) fn to_datetime(time: Time) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .context("Invalid commit timezone offset")?;

    let date = DateTime::from_timestamp(time.seconds(), 0)
        .context("Invalid commit timestamp")?
        .with_timezone(&offset);

    Ok(date)
}

/// Interprets a wall-clock timestamp in the local timezone.
pub(crate) fn local_git_time(timestamp: NaiveDateTime) -> Result<Time> {
    let local = Local
        .from_local_datetime(&timestamp)
        .earliest()
        .ok_or(ChronoError::NonexistentLocalTime(timestamp))?;

    let offset_minutes = local.offset().fix().local_minus_utc() / 60;
    Ok(Time::new(local.timestamp(), offset_minutes))
}

/// Formats `time` the way it ends a raw signature line, e.g. `1700000000 +0100`.
pub(crate) fn format_raw_time(time: &Time) -> String {
    let offset = time.offset_minutes();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.unsigned_abs();
    format!("{} {sign}{:02}{:02}", time.seconds(), offset / 60, offset % 60)
}
