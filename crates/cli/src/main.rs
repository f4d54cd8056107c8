mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stashbox",
    version,
    about = "Move backup files in and out of local or S3-compatible storage"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: <config dir>/stashbox/stashbox.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = config::AppConfig::resolve_path(cli.config.as_deref());

    match cli.command {
        commands::Command::Init(args) => commands::init::run(args, &config_path).await,
        commands::Command::Put(args) => commands::put::run(args, &config_path).await,
        commands::Command::Get(args) => commands::get::run(args, &config_path).await,
        commands::Command::Ls(args) => commands::ls::run(args, &config_path).await,
        commands::Command::Rm(args) => commands::rm::run(args, &config_path).await,
    }
}
