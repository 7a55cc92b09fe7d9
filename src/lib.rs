//! # git-chrono
//!
//! Reshapes the timeline of a git repository.
//!
//! - `generate` creates synthetic commits spread across a date window.
//! - `redistribute` spreads the commits of a recent period evenly across a
//!   target window by rewriting their timestamps.
//!
//! Both drivers in [`history`] work against the [`store::HistoryStore`]
//! trait; [`git::GitRepository`] implements it on top of libgit2.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use git_chrono::schedule::{daily_counts, DateAssigner, HourRange, Window};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let window = Window::new(NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(), 14).unwrap();
//! let assigner = DateAssigner::new(window, HourRange::WORKDAY);
//! let assignments = assigner.assign(17, &mut StdRng::seed_from_u64(1));
//!
//! assert_eq!(assignments.len(), 17);
//! assert_eq!(daily_counts(17, 14)[..3], [2, 2, 2]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod history;
pub mod schedule;
pub mod store;

pub use crate::cli::Cli;
pub use crate::error::ChronoError;

/// The current version of git-chrono.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
