use std::path::{Path, PathBuf};

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Session or credential setup failed while building a backend.
    #[error("failed to load storage configuration: {0}")]
    ConfigurationLoad(String),

    /// No endpoint is known for the requested service/region pair.
    #[error("unknown endpoint requested: service={service}, region={region}")]
    EndpointResolution { service: String, region: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote call failed for a reason other than a missing object.
    #[error("storage request failed for {key}: {message}")]
    Transport { key: String, message: String },
}

impl StorageError {
    /// Classify a filesystem error, keeping `NotFound` distinct from other I/O failures.
    pub fn from_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref();
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.display().to_string())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn transport(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Transport {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// True for both local disk failures and remote transport failures.
    pub fn is_io(&self) -> bool {
        matches!(self, StorageError::Io { .. } | StorageError::Transport { .. })
    }
}
