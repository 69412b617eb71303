use anyhow::{Context, Result};
use clap::Parser;

use gator::commands::{dispatch, Cli, State};
use gator::config::Config;
use gator::storage::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let location = config.database_location()?;
    let db = Database::open(&location)
        .await
        .with_context(|| format!("Failed to open database at {}", location))?;

    let mut state = State {
        db,
        config,
        config_path,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dispatch(&mut state, cli.command, &mut out).await
}
