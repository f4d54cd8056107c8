pub mod local;
pub mod s3;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{BackendKind, ClientConfig};
use crate::error::StorageResult;

use self::local::LocalBackend;
use self::s3::S3Backend;

/// One listing result. Order follows the backend's own enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub modified: DateTime<Utc>,
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Fetch the full content stored under `key`.
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Copy the local file at `source` to `destination` under the root.
    async fn write(&self, source: &Path, destination: &str) -> StorageResult<()>;

    async fn list(&self, prefix: &str) -> StorageResult<Vec<Entry>>;

    /// Delete `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Release the client. Consumes it, so it can only happen once.
    async fn close(self: Box<Self>) -> StorageResult<()>;
}

/// Build the backend selected by `kind`.
pub fn open_client(kind: BackendKind, config: &ClientConfig) -> StorageResult<Box<dyn StorageClient>> {
    match kind {
        BackendKind::Local => Ok(Box::new(LocalBackend::new(config)?)),
        BackendKind::S3 => Ok(Box::new(S3Backend::new(config)?)),
    }
}
