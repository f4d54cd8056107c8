use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::config::AppConfig;

#[derive(Args)]
pub struct LsArgs {
    /// Prefix relative to the configured root
    #[arg(default_value = "")]
    prefix: String,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: LsArgs, config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let client = config.open_client()?;
    let entries = client.list(&args.prefix).await?;
    client.close().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    println!("{:<48} {:<20}", "NAME", "MODIFIED");
    println!("{}", "-".repeat(69));
    for entry in &entries {
        println!(
            "{:<48} {:<20}",
            entry.name,
            entry.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
