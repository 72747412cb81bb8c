use crate::error::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Flat directory of artifacts addressed by file name
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the directory if absent
    ///
    /// # Arguments
    /// * `base_path` - Root directory for the artifacts (e.g., "uploads")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a storage key to a filesystem path with security validation
    ///
    /// Keys are single path segments. Anything that could climb out of the base
    /// directory (separators, parent segments, absolute paths) is rejected, and an
    /// existing target must canonicalize to a descendant of the base directory.
    pub fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.contains(['/', '\\'])
            || Path::new(storage_key).is_absolute()
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Write `data` under `storage_key`, replacing any existing file of that name
    pub async fn write(&self, storage_key: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(path)
    }

    /// Open a stored file for reading, returning it with its size in bytes
    pub async fn open(&self, storage_key: &str) -> StorageResult<(fs::File, u64)> {
        let path = self.key_to_path(storage_key)?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        Ok((file, metadata.len()))
    }

    /// Check if a regular file exists under `storage_key`
    pub async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the size in bytes of a stored file
    pub async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(metadata.len()),
            Ok(_) => Err(StorageError::NotFound(storage_key.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Move `from_key` to `to_key` within the directory, replacing any existing file
    pub async fn rename(&self, from_key: &str, to_key: &str) -> StorageResult<PathBuf> {
        let from = self.key_to_path(from_key)?;
        let to = self.key_to_path(to_key)?;

        fs::rename(&from, &to).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to rename {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;

        tracing::debug!(from = %from_key, to = %to_key, "Local storage rename successful");
        Ok(to)
    }

    /// Delete a stored file; deleting a missing file is not an error
    pub async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), key = %storage_key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("incoming")).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_new_creates_directory() {
        let (dir, storage) = storage().await;
        assert!(dir.path().join("incoming").is_dir());
        assert_eq!(storage.base_path(), dir.path().join("incoming"));
    }

    #[tokio::test]
    async fn test_write_and_open() {
        let (_dir, storage) = storage().await;
        let path = storage.write("clip.mp4", b"video bytes").await.unwrap();
        assert!(path.starts_with(storage.base_path()));

        let (_file, size) = storage.open("clip.mp4").await.unwrap();
        assert_eq!(size, 11);
        assert!(storage.exists("clip.mp4").await.unwrap());
        assert_eq!(storage.content_length("clip.mp4").await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_write_overwrites_existing() {
        let (_dir, storage) = storage().await;
        storage.write("clip.mp4", b"first version").await.unwrap();
        let path = storage.write("clip.mp4", b"v2").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_key_to_path_rejects_traversal() {
        let (_dir, storage) = storage().await;
        for key in ["..", "../etc/passwd", "a/b.mp4", "..\\x.mp4", "/etc/passwd", ""] {
            assert!(
                matches!(storage.key_to_path(key), Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_key_to_path_rejects_symlink_escape() {
        let (dir, storage) = storage().await;
        let outside = dir.path().join("secret.txt");
        std::fs::write(&outside, b"secret").unwrap();
        std::os::unix::fs::symlink(&outside, storage.base_path().join("link.mp4")).unwrap();

        assert!(matches!(
            storage.key_to_path("link.mp4"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.open("nope.mp4").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.content_length("nope.mp4").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(!storage.exists("nope.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_replaces_target() {
        let (_dir, storage) = storage().await;
        storage.write(".clip.mp4", b"fresh").await.unwrap();
        storage.write("clip.mp4", b"stale").await.unwrap();

        let path = storage.rename(".clip.mp4", "clip.mp4").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"fresh");
        assert!(!storage.exists(".clip.mp4").await.unwrap());
        assert!(matches!(
            storage.rename("missing.mp4", "clip.mp4").await,
            Err(StorageError::WriteFailed(_))
        ));
        assert!(matches!(
            storage.rename("clip.mp4", "../clip.mp4").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, storage) = storage().await;
        storage.write("clip.mp4", b"data").await.unwrap();
        storage.delete("clip.mp4").await.unwrap();
        storage.delete("clip.mp4").await.unwrap();
        assert!(!storage.exists("clip.mp4").await.unwrap());
    }
}
