pub mod client;
pub mod error;
pub mod sort;
pub mod token;
pub mod types;

pub use client::DriveStorage;
pub use error::StorageError;
pub use types::{DriveItem, RemoteFile, SharedDrive};

use async_trait::async_trait;
use bytes::Bytes;

use crate::common::types::{DriveId, FileId};

/// Seam to the storage provider. `DriveStorage` is the real client; tests
/// substitute their own implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Resolve a file's metadata by id.
    async fn file_info(&self, file: &FileId) -> Result<RemoteFile, StorageError>;

    /// Download a file's raw bytes. Transfers larger than `max_bytes` are
    /// aborted mid-stream with [`StorageError::TooLarge`].
    async fn download(&self, file: &FileId, max_bytes: u64) -> Result<Bytes, StorageError>;

    /// All shared drives visible to the configured account.
    async fn list_drives(&self) -> Result<Vec<SharedDrive>, StorageError>;

    /// Root-level folders of a shared drive, natural-sorted.
    async fn list_folders(&self, drive: &DriveId) -> Result<Vec<DriveItem>, StorageError>;

    /// Children of a folder, natural-sorted.
    async fn list_files(
        &self,
        folder: &str,
        drive: Option<&DriveId>,
    ) -> Result<Vec<DriveItem>, StorageError>;

    /// Name search across drives, case-insensitive.
    async fn search(
        &self,
        query: &str,
        drive: Option<&DriveId>,
    ) -> Result<Vec<DriveItem>, StorageError>;
}
