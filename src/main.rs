use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use prism_releases::{build_client, latest_releases, Config, ReleaseChannels};

/// Get the default config path (~/.config/prism-releases/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("prism-releases")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "prism-releases",
    about = "Print the current PrismLinux release list as JSON"
)]
struct Args {
    /// Config file (defaults to ~/.config/prism-releases/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Group releases into stable/beta/alpha channels
    #[arg(long)]
    channels: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let client = build_client(&config).context("Failed to build HTTP client")?;
    let releases = latest_releases(&client, &config).await;

    let json = match (args.channels, args.pretty) {
        (true, true) => serde_json::to_string_pretty(&ReleaseChannels::from_releases(&releases)),
        (true, false) => serde_json::to_string(&ReleaseChannels::from_releases(&releases)),
        (false, true) => serde_json::to_string_pretty(&releases),
        (false, false) => serde_json::to_string(&releases),
    }
    .context("Failed to serialize releases")?;

    println!("{json}");
    Ok(())
}
