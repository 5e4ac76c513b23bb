use serde::{Deserialize, Serialize};

/// Credentials and endpoints for the storage provider (a Drive-v3-shaped API).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
  pub api_base: String,
  pub token_uri: String,
  pub client_id: String,
  pub client_secret: String,
  pub refresh_token: String,
  /// Optional seed access token; refreshed once it expires.
  #[serde(default)]
  pub access_token: String,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      api_base: "https://www.googleapis.com/drive/v3".to_string(),
      token_uri: "https://oauth2.googleapis.com/token".to_string(),
      client_id: String::new(),
      client_secret: String::new(),
      refresh_token: String::new(),
      access_token: String::new(),
    }
  }
}
