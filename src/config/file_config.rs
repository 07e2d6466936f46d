//! Optional TOML file configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Raw TOML config. Every field is optional; file values override CLI
/// arguments during resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub api_base_url: Option<String>,
    pub token: Option<String>,
    pub time_range: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&raw).context("Failed to parse config file")
    }
}
