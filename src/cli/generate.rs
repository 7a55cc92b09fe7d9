//! Generate command — creates synthetic commits across a date window.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

use crate::cli::{make_rng, GlobalArgs};
use crate::git::GitRepository;
use crate::history::Generator;

/// Generate command options.
#[derive(Parser)]
pub struct GenerateCommand {
    /// First day to generate commits for (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Number of days to generate commits for.
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,

    /// Seed for reproducible commit times.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let mut config = global.load_config()?.generate;
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(days) = self.days {
            config.days = days;
        }

        let mut repo = GitRepository::open_at(&global.repo)
            .context("Failed to open git repository. Make sure the path is a git repository.")?
            .with_log_file(config.log_file.clone());

        let generator = Generator::new(config)?;
        let summary = generator.run(&mut repo, &mut make_rng(self.seed))?;

        println!(
            "✅ Generated {} commits across {} days",
            summary.total(),
            summary.days.len()
        );
        Ok(())
    }
}
