use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::progress;

#[derive(Args)]
pub struct PutArgs {
    /// Local file to upload
    source: PathBuf,

    /// Destination relative to the configured root
    destination: String,
}

pub async fn run(args: PutArgs, config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let client = config.open_client()?;

    let size = tokio::fs::metadata(&args.source).await.ok().map(|m| m.len());
    let spinner = progress::transfer_spinner("Uploading", &args.destination, size);
    let result = client
        .write(&args.source, &args.destination)
        .await
        .with_context(|| format!("failed to write {}", args.destination));
    spinner.finish_and_clear();
    result?;
    client.close().await?;

    info!(source = %args.source.display(), destination = %args.destination, "Stored");
    Ok(())
}
