pub mod backend;
pub mod chunked;
pub mod config;
pub mod error;
pub mod key;

pub use backend::{Entry, StorageClient, open_client};
pub use config::{BackendKind, ClientConfig};
pub use error::{StorageError, StorageResult};
