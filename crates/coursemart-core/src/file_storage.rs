//! File storage abstraction layer.
//!
//! Content blocks reference their bytes through an opaque storage key (the
//! "locator"). [`FileStorage`] hides where those bytes live so the delivery
//! path and the authoring endpoints never touch paths directly.
//!
//! # Example
//!
//! ```ignore
//! use coursemart_core::file_storage::{FileStorage, LocalFileStorage};
//! use std::path::PathBuf;
//!
//! let storage = LocalFileStorage::new(PathBuf::from("./storage"));
//!
//! let key = storage.save("courses/abc/intro.mp4", &bytes).await?;
//! let blob = storage.open(&key).await?;
//! println!("{} bytes", blob.len);
//! storage.delete(&key).await?;
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncSeek};

use crate::errors::DeliveryError;

/// Anything the streamer can seek in and read from.
pub trait BlobReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T> BlobReader for T where T: AsyncRead + AsyncSeek + Send + Unpin {}

/// An opened blob: a fresh, exclusively owned handle plus its total length.
///
/// Dropping the value closes the handle.
pub struct StoredBlob {
    pub reader: Box<dyn BlobReader>,
    pub len: u64,
}

impl std::fmt::Debug for StoredBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredBlob").field("len", &self.len).finish()
    }
}

/// Abstract trait for file storage backends.
///
/// Implementations can be swapped without changing business logic.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Save file content under `key` and return the key.
    async fn save(&self, key: &str, content: &[u8]) -> Result<String, StorageError>;

    /// Delete a file by key. Deleting a missing file is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Open a file for reading. Every call returns an independent handle.
    async fn open(&self, key: &str) -> Result<StoredBlob, StorageError>;
}

/// Error type for file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("File not found")]
    NotFound,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl From<StorageError> for DeliveryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => DeliveryError::NotFound("content file"),
            StorageError::IoError(e) => DeliveryError::Io(e),
            other => DeliveryError::store(other),
        }
    }
}

/// Local filesystem-based file storage implementation.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    /// Base directory where files are stored
    base_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self::with_max_size(base_dir, 512 * 1024 * 1024)
    }

    pub fn with_max_size(base_dir: PathBuf, max_file_size: usize) -> Self {
        Self {
            base_dir,
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate storage key format to prevent path traversal.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\')
        {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with a separator".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_key(key)?;
        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, key: &str, content: &[u8]) -> Result<String, StorageError> {
        let file_path = self.path_for(key)?;

        if content.len() > self.max_file_size {
            return Err(StorageError::InvalidFileSize {
                max_bytes: self.max_file_size,
            });
        }

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&file_path, content).await?;

        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let file_path = self.path_for(key)?;

        match fs::remove_file(&file_path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, key: &str) -> Result<StoredBlob, StorageError> {
        let file_path = self.path_for(key)?;

        let file = match fs::File::open(&file_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        Ok(StoredBlob {
            reader: Box::new(file),
            len,
        })
    }
}

/// Reduce an uploaded file name to characters valid in a storage key.
///
/// Path components are dropped; anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').replace("..", "_");

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_validate_key_accepts_valid_keys() {
        assert!(LocalFileStorage::validate_key("courses/abc/intro.mp4").is_ok());
        assert!(LocalFileStorage::validate_key("courses/abc-123/notes_v2.pdf").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_path_traversal() {
        assert!(LocalFileStorage::validate_key("../../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("..\\windows\\system32").is_err());
    }

    #[test]
    fn test_validate_key_rejects_absolute_paths() {
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("\\windows\\system32").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("intro video.mp4"), "intro_video.mp4");
        assert_eq!(sanitize_file_name("../../secret.txt"), "secret.txt");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\clip.mov"), "clip.mov");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("..."), "upload");
    }

    #[tokio::test]
    async fn test_save_open_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf());

        let key = storage
            .save("courses/c1/lesson.bin", b"hello blob")
            .await
            .unwrap();
        assert_eq!(key, "courses/c1/lesson.bin");

        let mut blob = storage.open(&key).await.unwrap();
        assert_eq!(blob.len, 10);
        let mut content = Vec::new();
        blob.reader.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, b"hello blob");

        storage.delete(&key).await.unwrap();
        assert!(matches!(
            storage.open(&key).await,
            Err(StorageError::NotFound)
        ));
        // Deleting twice is fine.
        storage.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_content() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::with_max_size(dir.path().to_path_buf(), 4);

        let result = storage.save("courses/c1/big.bin", b"12345").await;
        assert!(matches!(
            result,
            Err(StorageError::InvalidFileSize { max_bytes: 4 })
        ));
    }

    #[test]
    fn test_storage_not_found_maps_to_delivery_not_found() {
        let err: DeliveryError = StorageError::NotFound.into();
        assert!(matches!(err, DeliveryError::NotFound(_)));
    }
}
