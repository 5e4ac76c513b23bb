use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found")]
    NotFound,

    #[error("storage credentials rejected")]
    Unauthorized,

    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("storage api returned status {0}")]
    Api(u16),

    #[error("file exceeds the allowed size")]
    TooLarge,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
