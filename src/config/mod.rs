//! Configuration for the generate and redistribute commands.
//!
//! Values are read from `$HOME/.git-chrono/config.yaml` unless another file is
//! given. A missing default file yields the built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ChronoError;
use crate::git::repository::DEFAULT_LOG_FILE;
use crate::schedule::{HourRange, Window};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChronoConfig {
    /// Synthetic commit generation.
    pub generate: GenerateConfig,

    /// Commit redistribution.
    pub redistribute: RedistributeConfig,
}

/// Settings for generating synthetic commits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// First day to generate commits for.
    pub start: NaiveDate,

    /// Number of days, the start day included.
    pub days: u32,

    /// Fewest commits on any day.
    pub min_per_day: u32,

    /// Most commits on any day.
    pub max_per_day: u32,

    /// Earliest commit hour.
    pub first_hour: u32,

    /// Latest commit hour, inclusive.
    pub last_hour: u32,

    /// Log file, relative to the working directory, that each commit appends to.
    pub log_file: PathBuf,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or_default(),
            days: 26,
            min_per_day: 10,
            max_per_day: 15,
            first_hour: HourRange::EXTENDED.first(),
            last_hour: HourRange::EXTENDED.last(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl GenerateConfig {
    /// The window commits are generated in.
    pub fn window(&self) -> Result<Window, ChronoError> {
        Window::new(self.start, self.days)
    }

    /// Hours generated commits may fall in.
    pub fn hours(&self) -> Result<HourRange, ChronoError> {
        HourRange::new(self.first_hour, self.last_hour)
    }

    /// Checks every value for consistency.
    pub fn validate(&self) -> Result<(), ChronoError> {
        self.window()?;
        self.hours()?;
        if self.min_per_day > self.max_per_day {
            return Err(ChronoError::InvalidDailyBounds {
                min: self.min_per_day,
                max: self.max_per_day,
            });
        }
        Ok(())
    }
}

/// Settings for redistributing recent commits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedistributeConfig {
    /// Commits newer than this many days are redistributed.
    pub lookback_days: u32,

    /// First day of the target window; defaults to a window ending today.
    pub target_start: Option<NaiveDate>,

    /// Length of the target window in days.
    pub target_days: u32,

    /// Earliest commit hour.
    pub first_hour: u32,

    /// Latest commit hour, inclusive.
    pub last_hour: u32,
}

impl Default for RedistributeConfig {
    fn default() -> Self {
        Self {
            lookback_days: 14,
            target_start: None,
            target_days: 14,
            first_hour: HourRange::WORKDAY.first(),
            last_hour: HourRange::WORKDAY.last(),
        }
    }
}

impl RedistributeConfig {
    /// The target window for a run on `today`.
    pub fn target_window(&self, today: NaiveDate) -> Result<Window, ChronoError> {
        match self.target_start {
            Some(start) => Window::new(start, self.target_days),
            None => Window::ending_on(today, self.target_days),
        }
    }

    /// Hours redistributed commits may fall in.
    pub fn hours(&self) -> Result<HourRange, ChronoError> {
        HourRange::new(self.first_hour, self.last_hour)
    }

    /// The oldest commit time that is still redistributed for a run at `now`.
    pub fn cutoff(&self, now: DateTime<Local>) -> Result<DateTime<Local>, ChronoError> {
        Duration::try_days(i64::from(self.lookback_days))
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or(ChronoError::LookbackOutOfRange {
                days: self.lookback_days,
            })
    }

    /// Checks every value for consistency for a run at `now`.
    pub fn validate(&self, now: DateTime<Local>) -> Result<(), ChronoError> {
        self.target_window(now.date_naive())?;
        self.hours()?;
        self.cutoff(now)?;
        Ok(())
    }
}

impl ChronoConfig {
    /// Returns the default config path (~/.git-chrono/config.yaml).
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".git-chrono")
            .join("config.yaml")
    }

    /// Loads the config from `path`, or from the default location when `None`.
    ///
    /// An explicitly named file must exist; a missing default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = Self::default_config_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from_path(&path)
            }
        }
    }

    /// Loads the config from a specific file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Writes the config to `path` as YAML, creating parent directories.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_observed_runs() {
        let config = ChronoConfig::default();

        assert_eq!(
            config.generate.start,
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
        );
        assert_eq!(config.generate.days, 26);
        assert_eq!(
            (config.generate.min_per_day, config.generate.max_per_day),
            (10, 15)
        );
        assert_eq!(config.generate.hours().unwrap(), HourRange::EXTENDED);
        assert_eq!(config.redistribute.target_days, 14);
        assert_eq!(config.redistribute.hours().unwrap(), HourRange::WORKDAY);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "generate:\n  days: 3\nredistribute:\n  target_start: 2025-11-14\n",
        )
        .unwrap();

        let config = ChronoConfig::load(Some(path.as_path())).unwrap();

        assert_eq!(config.generate.days, 3);
        assert_eq!(config.generate.max_per_day, 15);
        assert_eq!(
            config.redistribute.target_start,
            NaiveDate::from_ymd_opt(2025, 11, 14)
        );
        assert_eq!(config.redistribute.lookback_days, 14);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.yaml");
        assert!(ChronoConfig::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = ChronoConfig::default();
        config.redistribute.first_hour = 10;
        config.save_to_file(&path).unwrap();

        assert_eq!(ChronoConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn target_window_defaults_to_ending_today() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 27).unwrap();
        let window = RedistributeConfig::default().target_window(today).unwrap();

        assert_eq!(window.start(), NaiveDate::from_ymd_opt(2025, 11, 14).unwrap());
        assert_eq!(window.end(), today);
    }

    #[test]
    fn validation_rejects_inverted_daily_bounds() {
        let config = GenerateConfig {
            min_per_day: 5,
            max_per_day: 2,
            ..GenerateConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ChronoError::InvalidDailyBounds { min: 5, max: 2 })
        );
    }

    #[test]
    fn validation_rejects_bad_hours() {
        let config = RedistributeConfig {
            first_hour: 18,
            last_hour: 9,
            ..RedistributeConfig::default()
        };
        assert!(config.validate(Local::now()).is_err());
    }

    #[test]
    fn validation_rejects_lookback_past_calendar_range() {
        let config = RedistributeConfig {
            lookback_days: u32::MAX,
            ..RedistributeConfig::default()
        };
        let expected = Err(ChronoError::LookbackOutOfRange { days: u32::MAX });

        assert_eq!(config.cutoff(Local::now()), expected);
        assert_eq!(config.validate(Local::now()), expected.map(|_| ()));
    }
}
