use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::common::http::HttpClient;
use crate::common::types::{DriveId, FileId};
use crate::configs::StorageConfig;
use crate::storage::error::StorageError;
use crate::storage::sort::sort_items;
use crate::storage::token::TokenKeeper;
use crate::storage::types::{DriveItem, FOLDER_MIME, RemoteFile, SharedDrive};
use crate::storage::StorageBackend;

const ITEM_FIELDS: &str = "id, name, mimeType, webViewLink, thumbnailLink, driveId, parents, size";
const DRIVE_FIELDS: &str = "id, name, themeId, colorRgb, backgroundImageLink, createdTime";
const PAGE_SIZE: &str = "200";

#[derive(Debug, serde::Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveItem>,
}

#[derive(Debug, serde::Deserialize)]
struct DriveList {
    #[serde(default)]
    drives: Vec<SharedDrive>,
}

/// Reqwest client for a Drive-v3-shaped storage API. Every call carries a
/// bearer token from the [`TokenKeeper`]; a 401 triggers one forced refresh
/// and a single retry.
pub struct DriveStorage {
    http: reqwest::Client,
    config: StorageConfig,
    token: TokenKeeper,
}

impl DriveStorage {
    pub fn new(config: StorageConfig) -> Result<Self, reqwest::Error> {
        let http = HttpClient::new()?;
        let token = TokenKeeper::new(http.clone(), config.clone());
        Ok(Self {
            http,
            config,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn send_authorized(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, StorageError> {
        let token = self.token.get().await?;
        let resp = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&token)
            .send()
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        warn!("Storage API rejected the access token, refreshing and retrying once");
        let token = self.token.force_refresh().await?;
        let retry = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&token)
            .send()
            .await?;

        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(StorageError::Unauthorized);
        }
        Ok(retry)
    }

    async fn list(&self, query: &[(&str, String)]) -> Result<Vec<DriveItem>, StorageError> {
        let resp = self.send_authorized(&self.url("files"), query).await?;
        if !resp.status().is_success() {
            return Err(StorageError::Api(resp.status().as_u16()));
        }
        let list: FileList = resp.json().await?;
        Ok(list.files)
    }
}

#[async_trait]
impl StorageBackend for DriveStorage {
    async fn file_info(&self, file: &FileId) -> Result<RemoteFile, StorageError> {
        let url = self.url(&format!("files/{}", urlencoding::encode(file)));
        let query = [
            ("fields", "id, name, mimeType, size, driveId".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let resp = self.send_authorized(&url, &query).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound),
            s if !s.is_success() => Err(StorageError::Api(s.as_u16())),
            _ => {
                let item: DriveItem = resp.json().await?;
                Ok(item.into_remote())
            }
        }
    }

    async fn download(&self, file: &FileId, max_bytes: u64) -> Result<Bytes, StorageError> {
        let url = self.url(&format!("files/{}", urlencoding::encode(file)));
        let query = [
            ("alt", "media".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let resp = self.send_authorized(&url, &query).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound),
            s if !s.is_success() => return Err(StorageError::Api(s.as_u16())),
            _ => {}
        }

        let mut body = BytesMut::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(StorageError::TooLarge);
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Downloaded {} bytes for file {}", body.len(), file);
        Ok(body.freeze())
    }

    async fn list_drives(&self) -> Result<Vec<SharedDrive>, StorageError> {
        let query = [
            ("pageSize", "100".to_string()),
            ("fields", format!("nextPageToken, drives({})", DRIVE_FIELDS)),
        ];
        let resp = self.send_authorized(&self.url("drives"), &query).await?;
        if !resp.status().is_success() {
            return Err(StorageError::Api(resp.status().as_u16()));
        }
        let list: DriveList = resp.json().await?;
        Ok(list.drives)
    }

    async fn list_folders(&self, drive: &DriveId) -> Result<Vec<DriveItem>, StorageError> {
        let q = format!(
            "mimeType='{}' and trashed=false and parents in '{}'",
            FOLDER_MIME,
            escape_query(drive)
        );
        let query = [
            ("q", q),
            ("corpora", "drive".to_string()),
            ("driveId", drive.to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("fields", format!("nextPageToken, files({})", ITEM_FIELDS)),
            ("pageSize", PAGE_SIZE.to_string()),
        ];

        let mut folders = self.list(&query).await?;
        sort_items(&mut folders);
        Ok(folders)
    }

    async fn list_files(
        &self,
        folder: &str,
        drive: Option<&DriveId>,
    ) -> Result<Vec<DriveItem>, StorageError> {
        let q = format!("'{}' in parents and trashed=false", escape_query(folder));
        let mut query = vec![
            ("q", q),
            ("includeItemsFromAllDrives", "true".to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("fields", format!("nextPageToken, files({})", ITEM_FIELDS)),
            ("pageSize", PAGE_SIZE.to_string()),
        ];
        match drive {
            Some(drive) => {
                query.push(("driveId", drive.to_string()));
                query.push(("corpora", "drive".to_string()));
            }
            None => query.push(("corpora", "user".to_string())),
        }

        let mut files = self.list(&query).await?;
        sort_items(&mut files);
        Ok(files)
    }

    async fn search(
        &self,
        needle: &str,
        drive: Option<&DriveId>,
    ) -> Result<Vec<DriveItem>, StorageError> {
        let escaped = escape_query(needle);
        // Widened query; precise matching happens client-side below.
        let q = format!(
            "(name contains '{}' or name contains '{}' or name contains '{}') and trashed=false",
            escaped,
            escape_query(&needle.to_lowercase()),
            escape_query(&needle.to_uppercase())
        );
        let mut query = vec![
            ("q", q),
            ("includeItemsFromAllDrives", "true".to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("fields", format!("nextPageToken, files({})", ITEM_FIELDS)),
            ("pageSize", PAGE_SIZE.to_string()),
        ];
        if let Some(drive) = drive {
            query.push(("driveId", drive.to_string()));
        }

        let files = self.list(&query).await?;
        let lowered = needle.to_lowercase();
        let collapsed = lowered.replace(char::is_whitespace, "");
        Ok(files
            .into_iter()
            .filter(|f| {
                let name = f.name.to_lowercase();
                name.contains(&lowered) || name.contains(&collapsed)
            })
            .collect())
    }
}

/// The provider's query language delimits strings with single quotes;
/// both quote characters in user input are folded to an escaped quote.
fn escape_query(input: &str) -> String {
    input.replace(['\'', '"'], "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_escaped_in_queries() {
        assert_eq!(escape_query("Rock'n'Roll"), "Rock\\'n\\'Roll");
        assert_eq!(escape_query(r#"say "hi""#), "say \\'hi\\'");
        assert_eq!(escape_query("plain"), "plain");
    }
}
