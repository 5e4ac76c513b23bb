use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::common::types::{SharedRw, now_ms};
use crate::configs::StorageConfig;
use crate::storage::error::StorageError;

/// Keep a margin before expiry to account for request time.
const EXPIRY_MARGIN_MS: u64 = 10_000;

/// Lifetime assumed for a seed token taken from the config file; after this
/// window the keeper falls back to a proper refresh.
const SEED_TOKEN_TTL_MS: u64 = 300_000;

#[derive(Clone, Debug)]
struct AccessToken {
    value: String,
    expiry_ms: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Caches the provider access token and refreshes it through the OAuth
/// refresh-token grant when it runs out.
pub struct TokenKeeper {
    client: reqwest::Client,
    config: StorageConfig,
    token: SharedRw<Option<AccessToken>>,
}

impl TokenKeeper {
    pub fn new(client: reqwest::Client, config: StorageConfig) -> Self {
        let seed = if config.access_token.is_empty() {
            None
        } else {
            Some(AccessToken {
                value: config.access_token.clone(),
                expiry_ms: now_ms() + SEED_TOKEN_TTL_MS,
            })
        };
        Self {
            client,
            config,
            token: Arc::new(RwLock::new(seed)),
        }
    }

    pub async fn get(&self) -> Result<String, StorageError> {
        {
            let token_lock = self.token.read().await;
            if let Some(token) = &*token_lock {
                if still_valid(token.expiry_ms, now_ms()) {
                    return Ok(token.value.clone());
                }
            }
        }
        self.force_refresh().await
    }

    /// Unconditionally runs the refresh grant. Used on startup-expiry and
    /// after a 401 from the API.
    pub async fn force_refresh(&self) -> Result<String, StorageError> {
        debug!("Refreshing storage access token...");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let resp = self
            .client
            .post(&self.config.token_uri)
            .form(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            error!("Token endpoint returned status {}: {}", status, body);
            return Err(StorageError::TokenRefresh(format!("status {}", status)));
        }

        let grant: TokenResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::TokenRefresh(e.to_string()))?;

        let expiry_ms = now_ms() + grant.expires_in.saturating_mul(1_000);
        let mut token_lock = self.token.write().await;
        *token_lock = Some(AccessToken {
            value: grant.access_token.clone(),
            expiry_ms,
        });

        debug!("Storage token refreshed. Expiry: {}", expiry_ms);
        Ok(grant.access_token)
    }
}

fn still_valid(expiry_ms: u64, now_ms: u64) -> bool {
    expiry_ms > now_ms + EXPIRY_MARGIN_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_within_margin_counts_as_expired() {
        let now = 1_000_000;
        assert!(still_valid(now + EXPIRY_MARGIN_MS + 1, now));
        assert!(!still_valid(now + EXPIRY_MARGIN_MS, now));
        assert!(!still_valid(now, now));
    }

    #[test]
    fn grant_response_parses() {
        let grant: TokenResponse =
            serde_json::from_str(r#"{"access_token":"ya29.x","expires_in":3599,"scope":"drive"}"#)
                .expect("parses");
        assert_eq!(grant.access_token, "ya29.x");
        assert_eq!(grant.expires_in, 3599);
    }
}
