use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  /// Optional shared secret. Empty string disables request authentication.
  #[serde(default)]
  pub password: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".to_string(),
      port: 4180,
      password: String::new(),
    }
  }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
  pub level: Option<String>,
  pub filters: Option<String>,
}
