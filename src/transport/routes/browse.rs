use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::common::ApiError;
use crate::common::types::DriveId;
use crate::server::AppState;
use crate::storage::StorageError;

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    #[serde(rename = "driveId")]
    pub drive_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    #[serde(rename = "driveId")]
    pub drive_id: Option<String>,
}

/// GET /v1/drives
pub async fn list_drives(State(state): State<Arc<AppState>>) -> Response {
    match state.storage.list_drives().await {
        Ok(drives) => Json(json!({ "sharedDrives": drives })).into_response(),
        Err(err) => storage_error(err).into_response(),
    }
}

/// GET /v1/drives/{drive_id}/folders
pub async fn list_folders(
    Path(drive_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!("Listing root folders for drive {}", drive_id);
    match state.storage.list_folders(&DriveId(drive_id)).await {
        Ok(folders) => Json(json!({ "folders": folders })).into_response(),
        Err(err) => storage_error(err).into_response(),
    }
}

/// GET /v1/folders/{folder_id}/files?driveId=...
pub async fn list_files(
    Path(folder_id): Path<String>,
    Query(params): Query<ScopeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let drive = params.drive_id.map(DriveId);
    match state.storage.list_files(&folder_id, drive.as_ref()).await {
        Ok(files) => Json(json!({ "files": files })).into_response(),
        Err(err) => storage_error(err).into_response(),
    }
}

/// GET /v1/search?query=...&driveId=...
pub async fn search(
    Query(params): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(needle) = params.query.filter(|q| !q.trim().is_empty()) else {
        return ApiError::bad_request("query is required").into_response();
    };
    let drive = params.drive_id.map(DriveId);
    match state.storage.search(&needle, drive.as_ref()).await {
        Ok(files) => Json(json!({ "files": files })).into_response(),
        Err(err) => storage_error(err).into_response(),
    }
}

fn storage_error(err: StorageError) -> ApiError {
    match err {
        StorageError::NotFound => ApiError::not_found("Not found"),
        other => ApiError::internal(other.to_string()),
    }
}
