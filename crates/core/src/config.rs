use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Connection settings for a backend, fixed for the lifetime of the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
    #[serde(default)]
    pub bucket_name: String,
    pub root_path: String,
}

impl ClientConfig {
    pub fn local(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.root_path.is_empty() {
            return Err(StorageError::ConfigurationLoad(
                "root path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    S3,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            _ => Err(StorageError::ConfigurationLoad(format!(
                "unknown backend: {s} (supported: local, s3)"
            ))),
        }
    }
}
