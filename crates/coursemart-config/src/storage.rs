//! Content storage and streaming configuration.
//!
//! - `STORAGE_PATH`: directory holding uploaded blobs (default `storage`)
//! - `STORAGE_MAX_UPLOAD_BYTES`: largest accepted upload (default 512 MiB)
//! - `STREAM_CHUNK_BYTES`: chunk size used when streaming (default 1 MiB)

use std::env;
use std::path::PathBuf;

use crate::env_or;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
pub const DEFAULT_CHUNK_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("storage"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            chunk_size: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let chunk_size = env_or("STREAM_CHUNK_BYTES", DEFAULT_CHUNK_BYTES);

        Self {
            base_dir: env::var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage")),
            max_upload_bytes: env_or("STORAGE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            // A zero chunk size would never make progress.
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_BYTES
            } else {
                chunk_size
            },
        }
    }
}
