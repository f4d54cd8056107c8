use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::progress;

#[derive(Args)]
pub struct GetArgs {
    /// Key relative to the configured root
    key: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: GetArgs, config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let client = config.open_client()?;

    let data = client
        .read(&args.key)
        .await
        .with_context(|| format!("failed to read {}", args.key))?;
    client.close().await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &data)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                key = %args.key,
                output = %path.display(),
                size = %progress::format_bytes(data.len() as u64),
                "Fetched"
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
