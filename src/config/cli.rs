use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "fashion-etl")]
#[command(about = "Scrape a fashion catalog, clean it and load it into a spreadsheet and PostgreSQL")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Override source.base_url
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override source.delay_seconds
    #[arg(long, global = true)]
    pub delay: Option<f64>,

    /// Override load.output_path
    #[arg(long, global = true)]
    pub output_path: Option<String>,

    /// Override database.url
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Override sheets.spreadsheet_id
    #[arg(long, global = true)]
    pub spreadsheet_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Scrape every catalog page into the raw CSV file
    Extract,
    /// Clean the raw CSV file into the clean CSV file
    Transform,
    /// Send the clean CSV file to the configured sinks
    Load,
    /// Extract, transform and load in one go
    Run,
}

impl Cli {
    /// Reads the config file (or defaults) and applies command line overrides.
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(delay) = self.delay {
            config.source.delay_seconds = delay;
        }
        if let Some(output_path) = &self.output_path {
            config.load.output_path = output_path.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        if let Some(id) = &self.spreadsheet_id {
            config.sheets.spreadsheet_id = Some(id.clone());
        }
    }
}
