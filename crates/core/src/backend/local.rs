use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use super::{Entry, StorageClient};
use crate::config::ClientConfig;
use crate::error::{StorageError, StorageResult};

const WRITE_BLOCK: usize = 4096;
const READ_BLOCK: usize = 2048;

/// Backend rooted at a local directory. Holds no open handles between calls.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(config: &ClientConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self {
            root: PathBuf::from(&config.root_path),
        })
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

async fn create_dir_all(path: &Path) -> StorageResult<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| StorageError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Clear the way for a new file at `path`. Directories are never removed.
async fn remove_existing_file(path: &Path) -> StorageResult<()> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Err(StorageError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                "destination is a directory",
            ),
        }),
        Ok(_) => fs::remove_file(path)
            .await
            .map_err(|e| StorageError::from_io(path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::from_io(path, e)),
    }
}

/// Remove a file or directory tree; succeeds if nothing is there.
async fn remove_all(path: &Path) -> StorageResult<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StorageError::from_io(path, e)),
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::from_io(path, e)),
    }
}

#[async_trait]
impl StorageClient for LocalBackend {
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let full = self.full_path(key);
        let mut file = File::open(&full)
            .await
            .map_err(|e| StorageError::from_io(&full, e))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| StorageError::from_io(&full, e))?
            .len();

        let mut data = Vec::with_capacity(size as usize);
        let mut block = [0u8; READ_BLOCK];
        loop {
            let n = file
                .read(&mut block)
                .await
                .map_err(|e| StorageError::from_io(&full, e))?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&block[..n]);
        }
        debug!(path = %full.display(), bytes = data.len(), "Read file");
        Ok(data)
    }

    async fn write(&self, source: &Path, destination: &str) -> StorageResult<()> {
        let mut reader = File::open(source)
            .await
            .map_err(|e| StorageError::from_io(source, e))?;

        create_dir_all(&self.root).await?;
        let full = self.full_path(destination);
        if let Some(parent) = full.parent() {
            create_dir_all(parent).await?;
        }
        remove_existing_file(&full).await?;

        let mut writer = File::create(&full)
            .await
            .map_err(|e| StorageError::from_io(&full, e))?;
        let mut block = vec![0u8; WRITE_BLOCK];
        let mut copied = 0u64;
        loop {
            let n = reader
                .read(&mut block)
                .await
                .map_err(|e| StorageError::from_io(source, e))?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&block[..n])
                .await
                .map_err(|e| StorageError::from_io(&full, e))?;
            copied += n as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| StorageError::from_io(&full, e))?;

        debug!(source = %source.display(), destination = %full.display(), bytes = copied, "Copied file");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<Entry>> {
        let dir = self.full_path(prefix);
        let metadata = fs::metadata(&dir)
            .await
            .map_err(|e| StorageError::from_io(&dir, e))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotFound(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::from_io(&dir, e))?;
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(&dir, e))?
        {
            let path = entry.path();
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .map_err(|e| StorageError::from_io(&path, e))?;
            entries.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                modified: DateTime::<Utc>::from(modified),
            });
        }
        Ok(entries)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let full = self.full_path(key);
        remove_all(&full).await?;
        debug!(path = %full.display(), "Removed");
        Ok(())
    }

    async fn close(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(root: &Path) -> LocalBackend {
        LocalBackend::new(&ClientConfig::local(root.to_string_lossy())).unwrap()
    }

    fn source_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn write_creates_root_and_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), "hostname", b"backup-host\n");
        let root = dir.path().join("store");
        let backend = backend(&root);

        backend.write(&source, "sub/hostname.txt").await.unwrap();

        assert!(root.join("sub").is_dir());
        assert_eq!(
            std::fs::read(root.join("sub/hostname.txt")).unwrap(),
            b"backup-host\n"
        );
    }

    #[tokio::test]
    async fn read_after_write_returns_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
        let source = source_file(dir.path(), "payload.bin", &data);
        let backend = backend(&dir.path().join("store"));

        backend.write(&source, "payload.bin").await.unwrap();
        assert_eq!(backend.read("payload.bin").await.unwrap(), data);
    }

    #[tokio::test]
    async fn write_replaces_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir.path().join("store"));
        let long = source_file(dir.path(), "long", b"a much longer first version");
        let short = source_file(dir.path(), "short", b"v2");

        backend.write(&long, "file").await.unwrap();
        backend.write(&short, "file").await.unwrap();
        assert_eq!(backend.read("file").await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn write_never_replaces_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let backend = backend(&root);
        let source = source_file(dir.path(), "f", b"x");
        backend.write(&source, "daily/one.zip").await.unwrap();
        backend.write(&source, "daily/two.zip").await.unwrap();

        let err = backend.write(&source, "daily").await.unwrap_err();
        assert!(err.is_io());
        assert!(root.join("daily/one.zip").is_file());
        assert!(root.join("daily/two.zip").is_file());

        let err = backend.write(&source, "").await.unwrap_err();
        assert!(err.is_io());
        assert!(root.join("daily/one.zip").is_file());
    }

    #[tokio::test]
    async fn write_missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir.path().join("store"));
        let err = backend
            .write(&dir.path().join("absent"), "x")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn read_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        assert!(backend.read("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_returns_direct_children() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir.path().join("store"));
        let source = source_file(dir.path(), "f", b"x");
        backend.write(&source, "daily/one.zip").await.unwrap();
        backend.write(&source, "daily/two.zip").await.unwrap();
        backend.write(&source, "daily/nested/three.zip").await.unwrap();

        let mut names: Vec<_> = backend
            .list("daily")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, ["nested", "one.zip", "two.zip"]);
    }

    #[tokio::test]
    async fn list_fails_for_missing_or_non_directory_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir.path().join("store"));
        let source = source_file(dir.path(), "f", b"x");
        backend.write(&source, "file.txt").await.unwrap();

        assert!(backend.list("missing").await.unwrap_err().is_not_found());
        assert!(backend.list("file.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let backend = backend(&root);
        let source = source_file(dir.path(), "f", b"x");
        backend.write(&source, "tree/a/b.txt").await.unwrap();

        backend.remove("tree").await.unwrap();
        assert!(!root.join("tree").exists());
        backend.remove("tree").await.unwrap();
        backend.remove("never-existed").await.unwrap();
    }
}
