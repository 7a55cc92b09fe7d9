//! Configuration-related CLI commands.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::cli::GlobalArgs;
use crate::config::ChronoConfig;

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the effective configuration as YAML.
    Show(ShowCommand),
    /// Writes the default configuration to the config file.
    Init(InitCommand),
}

/// Show command options.
#[derive(Parser)]
pub struct ShowCommand {}

/// Init command options.
#[derive(Parser)]
pub struct InitCommand {
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show(show_cmd) => show_cmd.execute(global),
            ConfigSubcommands::Init(init_cmd) => init_cmd.execute(global),
        }
    }
}

impl ShowCommand {
    /// Executes the show command.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize config")?;
        print!("{yaml}");
        Ok(())
    }
}

impl InitCommand {
    /// Executes the init command.
    pub fn execute(self, global: &GlobalArgs) -> Result<()> {
        let path = global
            .config_file
            .clone()
            .unwrap_or_else(ChronoConfig::default_config_path);

        if path.exists() && !self.force {
            bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }

        ChronoConfig::default().save_to_file(&path)?;
        println!("✅ Wrote default configuration to {}", path.display());
        Ok(())
    }
}
