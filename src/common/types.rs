use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

/// A thread-safe, mutually exclusive shared component.
pub type Shared<T> = Arc<Mutex<T>>;

/// A thread-safe, read-write shared component.
pub type SharedRw<T> = Arc<RwLock<T>>;

/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Identifier of a file inside the storage provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl From<String> for FileId {
  fn from(s: String) -> Self {
    Self(s)
  }
}

impl From<&str> for FileId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl std::ops::Deref for FileId {
  type Target = str;
  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl std::fmt::Display for FileId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Identifier of a shared drive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DriveId(pub String);

impl From<String> for DriveId {
  fn from(s: String) -> Self {
    Self(s)
  }
}

impl From<&str> for DriveId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl std::ops::Deref for DriveId {
  type Target = str;
  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl std::fmt::Display for DriveId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}
