//! Filesystem blob backend for note attachments.
//!
//! Stores uploaded files under sharded UUIDv7-based paths with atomic
//! temp-file+rename writes. The public URL points at the API's `/files/:id`
//! route. Cloud providers slot in behind the same [`BlobBackend`] trait.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use quillnote_core::{new_v7, BlobBackend, Error, Result, StoredBlob};

/// Relative storage path for a blob id.
///
/// Path format: `blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin` — two shard
/// levels keep directory fan-out bounded.
pub fn generate_storage_path(id: &Uuid) -> String {
    let hex = id.as_hyphenated().to_string().replace('-', "");
    format!(
        "blobs/{}/{}/{}.bin",
        &hex[0..2],
        &hex[2..4],
        id.as_hyphenated()
    )
}

/// Filesystem blob backend.
pub struct FilesystemBlobBackend {
    base_path: PathBuf,
    /// Base URL the API serves blobs from, e.g. `http://localhost:3000`.
    public_base_url: String,
}

impl FilesystemBlobBackend {
    /// Create a new filesystem backend rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    fn path_for(&self, storage_id: &str) -> Result<PathBuf> {
        let id = Uuid::parse_str(storage_id)
            .map_err(|_| Error::InvalidInput(format!("invalid storage id: {storage_id}")))?;
        Ok(self.full_path(&generate_storage_path(&id)))
    }

    /// Validate that the backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("blobs/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }
}

#[async_trait]
impl BlobBackend for FilesystemBlobBackend {
    async fn store(
        &self,
        data: &[u8],
        original_name: &str,
        content_type: &str,
    ) -> Result<StoredBlob> {
        let id = new_v7();
        let storage_id = id.as_hyphenated().to_string();
        let full_path = self.full_path(&generate_storage_path(&id));

        debug!(
            subsystem = "database",
            component = "blobs",
            op = "store",
            storage_id = %storage_id,
            original_name = %original_name,
            content_type = %content_type,
            size = data.len(),
            "Storing blob"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "blobs: create_dir_all failed");
                Error::Upload(e.to_string())
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;
        file.write_all(data)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;
        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "blobs: rename failed");
            Error::Upload(e.to_string())
        })?;

        Ok(StoredBlob {
            url: format!("{}/files/{}", self.public_base_url, storage_id),
            storage_id,
        })
    }

    async fn read(&self, storage_id: &str) -> Result<Vec<u8>> {
        let path = self.path_for(storage_id)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("blob {storage_id}")))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn delete(&self, storage_id: &str) -> Result<()> {
        let path = self.path_for(storage_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path_is_sharded_by_uuid_prefix() {
        let id = Uuid::parse_str("0191e4a0-1234-7abc-8def-0123456789ab").unwrap();
        let path = generate_storage_path(&id);
        assert_eq!(
            path,
            "blobs/01/91/0191e4a0-1234-7abc-8def-0123456789ab.bin"
        );
    }

    #[tokio::test]
    async fn test_store_read_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBlobBackend::new(dir.path(), "http://localhost:3000/");

        let blob = backend
            .store(b"hello world", "hello.txt", "text/plain")
            .await
            .unwrap();
        assert!(blob.url.starts_with("http://localhost:3000/files/"));
        assert!(blob.url.ends_with(&blob.storage_id));

        let data = backend.read(&blob.storage_id).await.unwrap();
        assert_eq!(data, b"hello world");

        backend.delete(&blob.storage_id).await.unwrap();
        assert!(backend.read(&blob.storage_id).await.is_err());
    }

    #[tokio::test]
    async fn test_read_unknown_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBlobBackend::new(dir.path(), "http://localhost:3000");

        let missing = new_v7().as_hyphenated().to_string();
        match backend.read(&missing).await {
            Err(Error::NotFound(_)) => {}
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_storage_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBlobBackend::new(dir.path(), "http://localhost:3000");
        assert!(matches!(
            backend.read("../../../etc/passwd").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBlobBackend::new(dir.path(), "http://localhost:3000");
        backend.validate().await.unwrap();
    }
}
