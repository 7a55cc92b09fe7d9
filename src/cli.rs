//! CLI interface for git-chrono.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod config;
pub mod generate;
pub mod redistribute;

pub use config::ConfigCommand;
pub use generate::GenerateCommand;
pub use redistribute::RedistributeCommand;

use crate::config::ChronoConfig;

/// git-chrono: reshape the timeline of a git repository.
#[derive(Parser)]
#[command(name = "git-chrono")]
#[command(about = "Generate synthetic commits and redistribute commit timestamps", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path of the repository to operate on.
    #[arg(long, global = true, value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,

    /// Config file (defaults to ~/.git-chrono/config.yaml).
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Loads the configuration these options point at.
    pub fn load_config(&self) -> Result<ChronoConfig> {
        ChronoConfig::load(self.config_file.as_deref())
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Creates synthetic commits across a date window.
    Generate(GenerateCommand),
    /// Spreads recent commits evenly across a target window.
    Redistribute(RedistributeCommand),
    /// Shows or initializes the configuration.
    Config(ConfigCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(generate_cmd) => generate_cmd.execute(&self.global),
            Commands::Redistribute(redistribute_cmd) => redistribute_cmd.execute(&self.global),
            Commands::Config(config_cmd) => config_cmd.execute(&self.global),
        }
    }
}

/// Builds the random source, seeded when reproducible output is requested.
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
