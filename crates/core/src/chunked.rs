//! Upload of files larger than the split threshold as a sequence of part objects.
//!
//! Each part is staged in a temporary file named `zip.NNN`, uploaded under
//! `<destination>/zip.NNN`, then deleted before the next part is read. Part
//! names depend only on the index, so re-running an interrupted upload
//! overwrites the parts it already sent.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::key::KEY_SEPARATOR;

const PART_PREFIX: &str = "zip";

/// Sink for a single staged part.
#[async_trait]
pub trait PartUploader: Send + Sync {
    async fn upload_part(&self, source: &Path, key: &str) -> StorageResult<()>;
}

pub fn part_name(index: usize) -> String {
    format!("{PART_PREFIX}.{index:03}")
}

pub fn part_key(destination: &str, index: usize) -> String {
    format!("{destination}{KEY_SEPARATOR}{}", part_name(index))
}

/// Split `source` into `threshold`-sized parts and hand each to `uploader` in order.
///
/// Returns the number of parts uploaded. Parts already uploaded are left in
/// place if a later part fails.
pub async fn upload_in_parts<U: PartUploader + ?Sized>(
    uploader: &U,
    source: &Path,
    destination: &str,
    threshold: u64,
    temp_dir: &Path,
) -> StorageResult<usize> {
    let mut file = File::open(source)
        .await
        .map_err(|e| StorageError::from_io(source, e))?;
    let capacity = usize::try_from(threshold).map_err(|_| {
        StorageError::ConfigurationLoad(format!("split threshold too large: {threshold}"))
    })?;
    let mut buf = vec![0u8; capacity];

    let mut parts = 0;
    loop {
        let n = fill_buffer(&mut file, &mut buf)
            .await
            .map_err(|e| StorageError::from_io(source, e))?;
        if n == 0 {
            break;
        }
        parts += 1;

        let staged = PartFile::create(temp_dir, parts, &buf[..n]).await?;
        let key = part_key(destination, parts);
        uploader.upload_part(staged.path(), &key).await?;
        staged.release().await?;
        debug!(part = parts, bytes = n, key = %key, "Uploaded part");
    }

    Ok(parts)
}

/// Read until `buf` is full or the reader is exhausted.
async fn fill_buffer<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Temporary file holding one part. Removed on drop unless already released.
struct PartFile {
    path: PathBuf,
    released: bool,
}

impl PartFile {
    async fn create(dir: &Path, index: usize, data: &[u8]) -> StorageResult<Self> {
        let staged = Self {
            path: dir.join(part_name(index)),
            released: false,
        };
        let mut file = File::create(&staged.path)
            .await
            .map_err(|e| staged.io_error(e))?;
        file.write_all(data).await.map_err(|e| staged.io_error(e))?;
        file.flush().await.map_err(|e| staged.io_error(e))?;
        Ok(staged)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn release(mut self) -> StorageResult<()> {
        self.released = true;
        tokio::fs::remove_file(&self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingUploader {
        parts: Mutex<Vec<(String, Vec<u8>)>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl PartUploader for RecordingUploader {
        async fn upload_part(&self, source: &Path, key: &str) -> StorageResult<()> {
            let mut parts = self.parts.lock().unwrap();
            if self.fail_on == Some(parts.len() + 1) {
                return Err(StorageError::transport(key, "connection reset"));
            }
            let data = std::fs::read(source).unwrap();
            parts.push((key.to_string(), data));
            Ok(())
        }
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn is_empty_dir(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[test]
    fn part_names_are_zero_padded() {
        assert_eq!(part_name(1), "zip.001");
        assert_eq!(part_name(42), "zip.042");
        assert_eq!(part_key("daily/db.bak", 7), "daily/db.bak/zip.007");
    }

    #[tokio::test]
    async fn splits_into_ceil_parts_that_concatenate_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let source = dir.path().join("big.bin");
        let data = sample(25);
        std::fs::write(&source, &data).unwrap();

        let uploader = RecordingUploader::default();
        let parts = upload_in_parts(&uploader, &source, "dump", 10, staging.path())
            .await
            .unwrap();
        assert_eq!(parts, 3);

        let recorded = uploader.parts.into_inner().unwrap();
        let keys: Vec<_> = recorded.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["dump/zip.001", "dump/zip.002", "dump/zip.003"]);
        assert_eq!(recorded[2].1.len(), 5);

        let joined: Vec<u8> = recorded.into_iter().flat_map(|(_, d)| d).collect();
        assert_eq!(joined, data);
        assert!(is_empty_dir(staging.path()));
    }

    #[tokio::test]
    async fn exact_multiple_produces_no_empty_tail() {
        let dir = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let source = dir.path().join("even.bin");
        std::fs::write(&source, sample(20)).unwrap();

        let uploader = RecordingUploader::default();
        let parts = upload_in_parts(&uploader, &source, "even", 10, staging.path())
            .await
            .unwrap();
        assert_eq!(parts, 2);
    }

    #[tokio::test]
    async fn failed_upload_removes_staged_part_and_keeps_earlier_parts() {
        let dir = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let source = dir.path().join("big.bin");
        std::fs::write(&source, sample(30)).unwrap();

        let uploader = RecordingUploader {
            fail_on: Some(2),
            ..Default::default()
        };
        let err = upload_in_parts(&uploader, &source, "dump", 10, staging.path())
            .await
            .unwrap_err();
        assert!(err.is_io());

        let recorded = uploader.parts.into_inner().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(is_empty_dir(staging.path()));
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let staging = tempfile::tempdir().unwrap();
        let uploader = RecordingUploader::default();
        let err = upload_in_parts(
            &uploader,
            &staging.path().join("absent.bin"),
            "dump",
            10,
            staging.path(),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
