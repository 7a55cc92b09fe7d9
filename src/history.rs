//! The generate and redistribute drivers.

pub mod generator;
pub mod redistributor;
pub mod report;

pub use generator::{GenerationSummary, Generator};
pub use redistributor::{RedistributionOutcome, RedistributionReport, Redistributor};
pub use report::Distribution;

#[cfg(test)]
pub(crate) mod test_utils;
