use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use waterwatch_core::WatchSettings;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Watch AI chatbot activity and track its weekly water-usage gauge"
)]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the state file holding the weekly counter
    #[arg(short = 's', long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Cooldown between accepted detections, in milliseconds
    #[arg(long)]
    pub cooldown_ms: Option<i64>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Watch an activity feed on stdin and accumulate usage (default)
    Run,
    /// Print the current weekly counter and gauge
    Status,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// State file holding the persisted counter record
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Detection settings
    #[serde(default)]
    pub watch: WatchSettings,
}

fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|p| p.join("waterwatch/state.json"))
        .unwrap_or_else(|| PathBuf::from("waterwatch-state.json"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            watch: WatchSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {:?}", p))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", p));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("waterwatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/waterwatch/config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(ref state_file) = cli.state_file {
            self.state_path = state_file.clone();
        }
        if let Some(cooldown_ms) = cli.cooldown_ms {
            self.watch.cooldown_ms = cooldown_ms;
        }
    }
}
