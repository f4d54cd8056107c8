use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::AppConfig;

#[derive(Args)]
pub struct RmArgs {
    /// Key relative to the configured root
    key: String,
}

pub async fn run(args: RmArgs, config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let client = config.open_client()?;
    client
        .remove(&args.key)
        .await
        .with_context(|| format!("failed to remove {}", args.key))?;
    client.close().await?;

    info!(key = %args.key, "Removed");
    Ok(())
}
