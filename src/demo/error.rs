use axum::http::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

/// Everything that can go wrong while generating a demo clip. Each variant
/// renders as a human-readable message and maps onto one HTTP status.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("File not found")]
    NotFound,

    #[error("File is not an audio file ({0})")]
    UnsupportedType(String),

    #[error("File too large. Max 100MB.")]
    PayloadTooLarge,

    #[error("Server busy. Please try again later.")]
    ServerBusy,

    #[error("Could not download file: {0}")]
    DownloadFailed(String),

    #[error("The download took too long. Try a smaller file.")]
    Timeout,

    #[error("The transcode engine could not be loaded: {0}")]
    EngineLoadFailed(String),

    #[error("Demo synthesis failed: {0}")]
    TranscodeFailed(String),

    #[error("A demo is already being generated. Please wait for it to finish.")]
    Busy,

    #[error("Unknown error")]
    Unknown,
}

impl DemoError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ServerBusy | Self::Busy => StatusCode::SERVICE_UNAVAILABLE,
            Self::DownloadFailed(_)
            | Self::Timeout
            | Self::EngineLoadFailed(_)
            | Self::TranscodeFailed(_)
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for DemoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            StorageError::TooLarge => Self::PayloadTooLarge,
            other => Self::DownloadFailed(other.to_string()),
        }
    }
}
