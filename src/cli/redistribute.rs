//! Redistribute command — spreads recent commits evenly across a target window.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::cli::{make_rng, GlobalArgs};
use crate::git::GitRepository;
use crate::history::{RedistributionOutcome, RedistributionReport, Redistributor};

/// Redistribute command options.
#[derive(Parser)]
pub struct RedistributeCommand {
    /// First day of the target window (YYYY-MM-DD); defaults to a window ending today.
    #[arg(long, value_name = "DATE")]
    pub target_start: Option<NaiveDate>,

    /// Redistribute commits from this many past days.
    #[arg(long, value_name = "N")]
    pub lookback_days: Option<u32>,

    /// Seed for reproducible commit times.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

impl RedistributeCommand {
    /// Executes the redistribute command.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let mut config = global.load_config()?.redistribute;
        if self.target_start.is_some() {
            config.target_start = self.target_start;
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        let lookback_days = config.lookback_days;

        println!("Starting commit redistribution...");

        let mut repo = GitRepository::open_at(&global.repo)
            .context("Failed to open git repository. Make sure the path is a git repository.")?;

        let redistributor = Redistributor::new(config);
        let outcome = redistributor.run(&mut repo, &mut make_rng(self.seed), Local::now())?;

        if let RedistributionOutcome::Redistributed(report) = outcome {
            print_report(&report, lookback_days);
        }
        Ok(())
    }
}

/// Prints the resulting distribution and the follow-up commands.
fn print_report(report: &RedistributionReport, lookback_days: u32) {
    println!(
        "\n✅ Commit redistribution complete! ({} commits retimed, {} references moved)",
        report.rewrite.retimed, report.rewrite.refs_updated
    );

    if report.stashed {
        println!("Uncommitted changes were stashed during the rewrite and have been restored.");
    }

    println!("\nNew commit distribution:");
    print!("{}", report.distribution);

    println!("\n{}", "=".repeat(60));
    println!("Next steps:");
    println!("1. Review the commit distribution above");
    println!("2. Verify with: {}", verify_command(lookback_days));
    println!("3. If satisfied, force push with: git push origin --force --all");
    println!(
        "4. To restore from backup: git reset --hard {}",
        report.restore_point
    );
    println!("{}", "=".repeat(60));
}

/// The `git log` invocation that shows the redistributed range.
fn verify_command(lookback_days: u32) -> String {
    format!("git log --since='{lookback_days} days ago' --pretty=format:'%ad|%s' --date=short")
}
