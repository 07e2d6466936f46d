mod file_config;

pub use file_config::FileConfig;

use crate::spotify::TimeRange;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub token: Option<String>,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub api_base_url: String,
    pub token: String,
    pub time_range: TimeRange,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via the CLI or in the config file")
            })?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let api_base_url = file
            .api_base_url
            .or_else(|| cli.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let token = file.token.or_else(|| cli.token.clone()).ok_or_else(|| {
            anyhow::anyhow!(
                "An API token must be specified via --token, SPOTIFY_TOKEN or in the config file"
            )
        })?;

        let time_range = match file.time_range.as_deref() {
            Some(s) => parse_time_range(s)
                .ok_or_else(|| anyhow::anyhow!("Unknown time_range in config file: {}", s))?,
            None => cli.time_range,
        };

        Ok(Self {
            db_path,
            api_base_url,
            token,
            time_range,
        })
    }
}

/// Parses a time range string into TimeRange.
/// Uses clap's ValueEnum trait for parsing.
fn parse_time_range(s: &str) -> Option<TimeRange> {
    TimeRange::from_str(s, true).ok()
}
