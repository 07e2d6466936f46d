use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tunestats::config::{AppConfig, CliConfig, FileConfig};
use tunestats::pipeline::{StatsPipeline, StatsView};
use tunestats::spotify::{SpotifyClient, TimeRange};
use tunestats::stats_store::SqliteStatsStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite database file used for the stats cache.
    #[clap(value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Base URL of the Spotify Web API.
    #[clap(long)]
    pub api_base_url: Option<String>,

    /// OAuth bearer token for the Spotify Web API.
    #[clap(long, env = "SPOTIFY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// The listening-history window to aggregate.
    #[clap(long, value_enum, default_value_t = TimeRange::ShortTerm)]
    pub time_range: TimeRange,

    /// Skip the cache lookup and recompute from the API.
    #[clap(long)]
    pub force: bool,

    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!("tunestats {}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        api_base_url: cli_args.api_base_url,
        token: cli_args.token,
        time_range: cli_args.time_range,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite stats database at {:?}...", config.db_path);
    let store = Arc::new(SqliteStatsStore::new(&config.db_path)?);
    let client = Arc::new(SpotifyClient::new(&config.token)?);
    let pipeline = StatsPipeline::new(client, store, &config.api_base_url);

    match pipeline.refresh(config.time_range, cli_args.force).await {
        StatsView::Ready(result) => {
            println!("{}", serde_json::to_string_pretty(result.as_ref())?);
            Ok(())
        }
        StatsView::Empty => {
            info!("No listening history for {}", config.time_range);
            Ok(())
        }
        StatsView::Failed => anyhow::bail!(
            "Failed to aggregate stats for {}",
            config.time_range
        ),
    }
}
