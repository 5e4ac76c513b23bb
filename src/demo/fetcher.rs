use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::common::types::FileId;
use crate::demo::error::DemoError;
use crate::demo::limiter::{FetchPermit, ResourceLimiter};
use crate::storage::{RemoteFile, StorageBackend};

/// Ceiling on source file size.
pub const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Budget for the whole download transfer.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Media types accepted for demo synthesis.
pub const AUDIO_MIME_TYPES: [&str; 10] = [
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/m4a",
    "audio/mp4",
    "audio/aac",
    "audio/ogg",
    "audio/flac",
    "audio/x-m4a",
    "audio/x-mp4",
];

pub fn is_audio_mime(mime: &str) -> bool {
    AUDIO_MIME_TYPES.contains(&mime)
}

/// A downloaded source file. Holds its fetch slot until dropped, so the
/// limiter counts the whole fetch-and-process span, not just the transfer.
#[derive(Debug)]
pub struct FetchedAudio {
    pub file: RemoteFile,
    pub bytes: Bytes,
    _permit: FetchPermit,
}

/// Resolves a file id against the storage provider and pulls its bytes,
/// gated by media type, size ceiling, fetch-slot cap, and transfer timeout.
pub struct RemoteFileFetcher {
    storage: Arc<dyn StorageBackend>,
    limiter: Arc<ResourceLimiter>,
}

impl RemoteFileFetcher {
    pub fn new(storage: Arc<dyn StorageBackend>, limiter: Arc<ResourceLimiter>) -> Self {
        Self { storage, limiter }
    }

    pub async fn fetch(&self, file_id: &FileId) -> Result<FetchedAudio, DemoError> {
        // The slot spans metadata, transfer, and processing; it is released
        // when the returned value (or this frame, on error) drops.
        let permit = self.limiter.try_acquire()?;

        let file = self.storage.file_info(file_id).await?;
        debug!(
            "Resolved file {}: '{}' ({}, {} bytes)",
            file_id,
            file.name,
            file.mime_type,
            file.size.unwrap_or(0)
        );

        if !is_audio_mime(&file.mime_type) {
            return Err(DemoError::UnsupportedType(file.mime_type));
        }
        if let Some(size) = file.size {
            if size > MAX_FILE_BYTES {
                return Err(DemoError::PayloadTooLarge);
            }
        }

        let bytes = tokio::time::timeout(
            DOWNLOAD_TIMEOUT,
            self.storage.download(file_id, MAX_FILE_BYTES),
        )
        .await
        .map_err(|_| DemoError::Timeout)??;

        if bytes.is_empty() {
            return Err(DemoError::DownloadFailed("empty response body".into()));
        }

        Ok(FetchedAudio {
            file,
            bytes,
            _permit: permit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::common::types::DriveId;
    use crate::storage::{DriveItem, SharedDrive, StorageError};

    struct FakeStorage {
        mime: &'static str,
        declared_size: Option<u64>,
        body: Vec<u8>,
        delay: Duration,
        oversize_stream: bool,
        downloads: AtomicUsize,
    }

    impl FakeStorage {
        fn audio(body: &[u8]) -> Self {
            Self {
                mime: "audio/mpeg",
                declared_size: Some(body.len() as u64),
                body: body.to_vec(),
                delay: Duration::ZERO,
                oversize_stream: false,
                downloads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StorageBackend for FakeStorage {
        async fn file_info(&self, file: &FileId) -> Result<RemoteFile, StorageError> {
            Ok(RemoteFile {
                id: file.clone(),
                name: "Sample Track.mp3".to_string(),
                mime_type: self.mime.to_string(),
                size: self.declared_size,
                drive_id: None,
            })
        }

        async fn download(&self, _file: &FileId, max_bytes: u64) -> Result<Bytes, StorageError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.oversize_stream || self.body.len() as u64 > max_bytes {
                return Err(StorageError::TooLarge);
            }
            Ok(Bytes::from(self.body.clone()))
        }

        async fn list_drives(&self) -> Result<Vec<SharedDrive>, StorageError> {
            Ok(Vec::new())
        }

        async fn list_folders(&self, _drive: &DriveId) -> Result<Vec<DriveItem>, StorageError> {
            Ok(Vec::new())
        }

        async fn list_files(
            &self,
            _folder: &str,
            _drive: Option<&DriveId>,
        ) -> Result<Vec<DriveItem>, StorageError> {
            Ok(Vec::new())
        }

        async fn search(
            &self,
            _query: &str,
            _drive: Option<&DriveId>,
        ) -> Result<Vec<DriveItem>, StorageError> {
            Ok(Vec::new())
        }
    }

    fn fetcher(storage: FakeStorage) -> (RemoteFileFetcher, Arc<ResourceLimiter>, Arc<FakeStorage>) {
        let limiter = Arc::new(ResourceLimiter::default());
        let storage = Arc::new(storage);
        (
            RemoteFileFetcher::new(storage.clone(), limiter.clone()),
            limiter,
            storage,
        )
    }

    #[tokio::test]
    async fn happy_path_holds_the_slot_until_the_result_drops() {
        let (fetcher, limiter, _storage) = fetcher(FakeStorage::audio(b"ID3 tag and frames"));

        let fetched = fetcher.fetch(&FileId::from("f1")).await.expect("fetches");
        assert_eq!(fetched.file.name, "Sample Track.mp3");
        assert_eq!(limiter.available(), limiter.capacity() - 1);

        drop(fetched);
        assert_eq!(limiter.available(), limiter.capacity());
    }

    #[tokio::test]
    async fn non_audio_type_is_rejected_without_downloading() {
        let mut storage = FakeStorage::audio(b"...");
        storage.mime = "application/pdf";
        let (fetcher, limiter, _storage) = fetcher(storage);

        let err = fetcher.fetch(&FileId::from("f1")).await.expect_err("rejects");
        assert!(matches!(err, DemoError::UnsupportedType(_)));
        assert_eq!(limiter.available(), limiter.capacity());
    }

    #[tokio::test]
    async fn oversized_metadata_fails_before_any_transfer() {
        let mut storage = FakeStorage::audio(b"...");
        storage.declared_size = Some(110 * 1024 * 1024);
        let (fetcher, limiter, storage) = fetcher(storage);

        let err = fetcher.fetch(&FileId::from("f1")).await.expect_err("rejects");
        assert!(matches!(err, DemoError::PayloadTooLarge));
        assert_eq!(limiter.available(), limiter.capacity());
        assert_eq!(storage.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_transfer_is_cut_off_mid_stream() {
        let mut storage = FakeStorage::audio(b"...");
        // Provider metadata omits the size; the stream itself hits the cap.
        storage.declared_size = None;
        storage.oversize_stream = true;
        let (fetcher, limiter, _storage) = fetcher(storage);

        let err = fetcher.fetch(&FileId::from("f1")).await.expect_err("rejects");
        assert!(matches!(err, DemoError::PayloadTooLarge));
        assert_eq!(limiter.available(), limiter.capacity());
    }

    #[tokio::test]
    async fn all_slots_taken_fails_fast() {
        let (fetcher, limiter, storage) = fetcher(FakeStorage::audio(b"..."));
        let held: Vec<_> = (0..limiter.capacity())
            .map(|_| limiter.try_acquire().expect("slot"))
            .collect();

        let err = fetcher.fetch(&FileId::from("f1")).await.expect_err("busy");
        assert!(matches!(err, DemoError::ServerBusy));
        assert_eq!(storage.downloads.load(Ordering::SeqCst), 0);

        drop(held);
        assert!(fetcher.fetch(&FileId::from("f1")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_transfer_times_out() {
        let mut storage = FakeStorage::audio(b"...");
        storage.delay = DOWNLOAD_TIMEOUT + Duration::from_secs(5);
        let (fetcher, limiter, _storage) = fetcher(storage);

        let err = fetcher.fetch(&FileId::from("f1")).await.expect_err("times out");
        assert!(matches!(err, DemoError::Timeout));
        assert_eq!(limiter.available(), limiter.capacity());
    }

    #[tokio::test]
    async fn empty_body_is_a_download_failure() {
        let (fetcher, _limiter, _storage) = fetcher(FakeStorage::audio(b""));
        let err = fetcher.fetch(&FileId::from("f1")).await.expect_err("rejects");
        assert!(matches!(err, DemoError::DownloadFailed(_)));
    }
}
