use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Feed;

#[derive(Parser, Debug)]
#[command(name = "hn-feed")]
#[command(about = "Stream Hacker News stories in increments", long_about = None)]
pub struct Cli {
    /// Feed to read: top, new, best, ask, show or jobs
    #[arg(short, long, default_value = "top")]
    pub feed: Feed,

    /// Search term (uses HN search within the feed's kind of story)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Stop after this many stories have been shown
    #[arg(short, long, default_value_t = 30)]
    pub limit: usize,

    /// Stories revealed per increment (overrides settings)
    #[arg(long)]
    pub increment: Option<usize>,

    /// Stories requested per remote call (overrides settings)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Retries after a failed fetch before giving up
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Custom config directory (default: ~/.config/hn-feed)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or create settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: ConfigFormat,
    },
    /// Show the settings file path
    Path,
    /// Write a settings file with the default values
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {s}. Use 'toml' or 'json'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {s}. Use 'text' or 'json'")),
        }
    }
}
