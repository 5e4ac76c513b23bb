use serde::{Deserialize, Serialize};

use crate::common::types::AnyResult;
use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub engine: EngineConfig,
  pub logging: Option<LoggingConfig>,
}

impl Config {
  pub fn load() -> AnyResult<Self> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Err("config.toml or config.default.toml not found".into());
    };

    println!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.is_empty() {
      return Err(format!("{} is empty", config_path).into());
    }

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_minimal_config() {
    let config: Config = toml::from_str(
      r#"
        [server]
        host = "127.0.0.1"
        port = 9000

        [storage]
        api_base = "https://drive.example/v3"
        token_uri = "https://oauth.example/token"
        client_id = "id"
        client_secret = "secret"
        refresh_token = "refresh"
      "#,
    )
    .expect("parses");

    assert_eq!(config.server.port, 9000);
    assert!(config.server.password.is_empty());
    assert_eq!(config.storage.api_base, "https://drive.example/v3");
    assert!(config.engine.ffmpeg_path.is_none());
    assert!(config.logging.is_none());
  }
}
