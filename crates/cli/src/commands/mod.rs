pub mod get;
pub mod init;
pub mod ls;
pub mod put;
pub mod rm;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Write a storage config file
    Init(init::InitArgs),
    /// Upload a local file
    Put(put::PutArgs),
    /// Download an object
    Get(get::GetArgs),
    /// List entries under a prefix
    Ls(ls::LsArgs),
    /// Remove an object or directory
    Rm(rm::RmArgs),
}
