use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use tokio::fs::File;
use tracing::debug;

use super::{Entry, StorageClient};
use crate::chunked::{self, PartUploader};
use crate::config::ClientConfig;
use crate::error::{StorageError, StorageResult};
use crate::key;

/// Files larger than this are uploaded as separate part objects.
pub const SPLIT_THRESHOLD: u64 = 512 * 1024 * 1024;

pub const S3_SERVICE: &str = "s3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub partition: &'static str,
    pub url: &'static str,
    pub signing_region: &'static str,
}

const KNOWN_ENDPOINTS: &[(&str, &str, Endpoint)] = &[(
    S3_SERVICE,
    "ru-central1",
    Endpoint {
        partition: "yc",
        url: "https://storage.yandexcloud.net",
        signing_region: "ru-central1",
    },
)];

/// Map a service/region pair to its fixed endpoint.
pub fn resolve_endpoint(service: &str, region: &str) -> StorageResult<Endpoint> {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(s, r, _)| *s == service && *r == region)
        .map(|(_, _, endpoint)| endpoint.clone())
        .ok_or_else(|| StorageError::EndpointResolution {
            service: service.to_string(),
            region: region.to_string(),
        })
}

/// Backend for a single bucket on an S3-compatible service.
pub struct S3Backend {
    bucket: Box<Bucket>,
    root: String,
}

impl S3Backend {
    pub fn new(config: &ClientConfig) -> StorageResult<Self> {
        config.validate()?;
        let endpoint = resolve_endpoint(S3_SERVICE, &config.region)?;
        let region = Region::Custom {
            region: endpoint.signing_region.to_string(),
            endpoint: endpoint.url.to_string(),
        };
        let credentials = Credentials::new(
            Some(config.access_key_id.as_str()),
            Some(config.access_key_secret.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::ConfigurationLoad(e.to_string()))?;
        let bucket = Bucket::new(&config.bucket_name, region, credentials)
            .map_err(|e| StorageError::ConfigurationLoad(e.to_string()))?
            .with_path_style();

        debug!(
            bucket = %config.bucket_name,
            endpoint = endpoint.url,
            partition = endpoint.partition,
            "S3 session ready"
        );
        Ok(Self {
            bucket,
            root: config.root_path.clone(),
        })
    }

    fn key(&self, path: &str) -> String {
        key::object_key(&self.root, path)
    }

    async fn put_once(&self, source: &Path, destination: &str) -> StorageResult<()> {
        let mut file = File::open(source)
            .await
            .map_err(|e| StorageError::from_io(source, e))?;
        let full = self.key(destination);
        let response = self
            .bucket
            .put_object_stream(&mut file, &full)
            .await
            .map_err(|e| StorageError::transport(&full, e))?;
        check_status(&full, response.status_code())?;
        debug!(key = %full, bytes = response.uploaded_bytes(), "Put object");
        Ok(())
    }
}

/// Files strictly larger than `threshold` go through the split upload.
fn needs_split(size: u64, threshold: u64) -> bool {
    size > threshold
}

/// HTTP status carried by an SDK error, if any.
fn error_status(err: &S3Error) -> Option<u16> {
    match err {
        S3Error::HttpFailWithBody(code, _) => Some(*code),
        _ => None,
    }
}

fn check_status(key: &str, status: u16) -> StorageResult<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        code => Err(StorageError::transport(key, format!("unexpected status {code}"))),
    }
}

/// Listing entry for one object, or `None` for directory markers.
fn entry_from_object(key: &str, last_modified: &str) -> StorageResult<Option<Entry>> {
    let Some(name) = key::base_name(key) else {
        return Ok(None);
    };
    let modified = DateTime::parse_from_rfc3339(last_modified)
        .map_err(|e| StorageError::transport(key, format!("bad LastModified {last_modified:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(Some(Entry {
        name: name.to_string(),
        modified,
    }))
}

/// Flatten listed objects into entries, dropping directory markers.
fn entries_from_objects<'a>(
    objects: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> StorageResult<Vec<Entry>> {
    let mut entries = Vec::new();
    for (key, last_modified) in objects {
        if let Some(entry) = entry_from_object(key, last_modified)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

#[async_trait]
impl PartUploader for S3Backend {
    async fn upload_part(&self, source: &Path, key: &str) -> StorageResult<()> {
        self.put_once(source, key).await
    }
}

#[async_trait]
impl StorageClient for S3Backend {
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let full = self.key(key);
        let response = match self.bucket.get_object(&full).await {
            Ok(response) => response,
            Err(e) if error_status(&e) == Some(404) => return Err(StorageError::NotFound(full)),
            Err(e) => return Err(StorageError::transport(&full, e)),
        };
        check_status(&full, response.status_code())?;
        let data = response.to_vec();
        debug!(key = %full, bytes = data.len(), "Got object");
        Ok(data)
    }

    async fn write(&self, source: &Path, destination: &str) -> StorageResult<()> {
        let size = tokio::fs::metadata(source)
            .await
            .map_err(|e| StorageError::from_io(source, e))?
            .len();

        if needs_split(size, SPLIT_THRESHOLD) {
            let temp_dir = std::env::temp_dir();
            let parts =
                chunked::upload_in_parts(self, source, destination, SPLIT_THRESHOLD, &temp_dir)
                    .await?;
            debug!(source = %source.display(), parts, "Split upload complete");
            Ok(())
        } else {
            self.put_once(source, destination).await
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<Entry>> {
        let full = self.key(prefix);
        let results = self
            .bucket
            .list(full.clone(), None)
            .await
            .map_err(|e| StorageError::transport(&full, e))?;

        entries_from_objects(
            results
                .iter()
                .flat_map(|result| result.contents.iter())
                .map(|object| (object.key.as_str(), object.last_modified.as_str())),
        )
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let full = self.key(key);
        match self.bucket.delete_object(&full).await {
            Ok(response) => match check_status(&full, response.status_code()) {
                Err(StorageError::NotFound(_)) => Ok(()),
                other => other,
            },
            Err(e) if error_status(&e) == Some(404) => Ok(()),
            Err(e) => Err(StorageError::transport(&full, e)),
        }
    }

    async fn close(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}
