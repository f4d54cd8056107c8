use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use stashbox_core::{BackendKind, ClientConfig};

use crate::config::{AppConfig, StorageConfig};

#[derive(Args)]
pub struct InitArgs {
    /// Backend type: local or s3
    #[arg(long = "type")]
    kind: String,

    /// Base directory (local) or key prefix (s3)
    #[arg(long)]
    root: String,

    /// S3 region
    #[arg(long, default_value = "ru-central1")]
    region: String,

    /// S3 bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// S3 access key id
    #[arg(long)]
    access_key_id: Option<String>,

    /// S3 access key secret
    #[arg(long)]
    access_key_secret: Option<String>,
}

pub async fn run(args: InitArgs, config_path: &Path) -> Result<()> {
    let kind: BackendKind = args.kind.parse()?;
    let client = match kind {
        BackendKind::Local => ClientConfig::local(args.root),
        BackendKind::S3 => ClientConfig {
            region: args.region,
            bucket_name: args
                .bucket
                .ok_or_else(|| anyhow::anyhow!("--bucket required for S3 backend"))?,
            access_key_id: args
                .access_key_id
                .ok_or_else(|| anyhow::anyhow!("--access-key-id required for S3 backend"))?,
            access_key_secret: args
                .access_key_secret
                .ok_or_else(|| anyhow::anyhow!("--access-key-secret required for S3 backend"))?,
            root_path: args.root,
        },
    };

    let config = AppConfig {
        storage: StorageConfig { kind, client },
    };

    // Fail early on settings the backend would reject.
    config.open_client()?.close().await?;
    config.save(config_path)?;

    info!(config_path = %config_path.display(), backend = %kind, "Config saved");
    println!("Config: {}", config_path.display());
    Ok(())
}
