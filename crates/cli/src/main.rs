//! ee-draws entry point.
//!
//! Runs one synchronization pass against the configured store and exits.
//! Configuration comes from `EE_DRAWS_*` environment variables and an
//! optional TOML file. Logs go to stderr; the pass summary is printed to
//! stdout as JSON.

use anyhow::{Context, Result};
use eedraws_client::{FetchClient, FetchConfig, SourceUrls, sync};
use eedraws_core::{AppConfig, HistoryDb};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(db = %config.db_path.display(), "starting sync");

    let client = FetchClient::new(FetchConfig::from(&config))?;
    let db = HistoryDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let outcome = sync::run(&client, &db, &SourceUrls::from(&config)).await;
    let closed = db.close().await;

    let report = outcome.context("sync failed")?;
    closed.context("closing store")?;

    tracing::info!(newest = %report.newest_round, "sync complete");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
