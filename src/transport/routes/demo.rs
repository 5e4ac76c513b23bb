use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::common::ApiError;
use crate::common::types::FileId;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DemoQuery {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
    /// Accepted for interface compatibility; file ids are globally unique
    /// at the provider, so resolution does not need the drive.
    #[serde(rename = "driveId")]
    #[allow(dead_code)]
    pub drive_id: Option<String>,
}

/// GET /v1/demo?fileId=...&driveId=...
///
/// Runs the whole demo pipeline and answers with the synthesized clip, or
/// a JSON `{ "error": ... }` body mapped from the failure.
pub async fn generate_demo(
    Query(params): Query<DemoQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(file_id) = params.file_id.filter(|id| !id.is_empty()) else {
        return ApiError::bad_request("File ID is required").into_response();
    };
    let file_id = FileId(file_id);
    info!("Demo requested for file {}", file_id);

    match state.pipeline.generate(&file_id).await {
        Ok(clip) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                sanitize_header(&clip.filename)
            );
            let headers = [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("audio/mpeg"),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    header_value(&disposition),
                ),
                (
                    header::HeaderName::from_static("x-original-filename"),
                    header_value(&sanitize_header(&clip.original_name)),
                ),
            ];
            (headers, clip.bytes).into_response()
        }
        Err(err) => ApiError::new(err.status(), err.to_string()).into_response(),
    }
}

/// GET /v1/demo/progress
pub async fn demo_progress(State(state): State<Arc<AppState>>) -> Response {
    Json(state.pipeline.snapshot()).into_response()
}

/// Header values must stay within visible ASCII; anything else becomes '_'.
fn sanitize_header(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                if c == '"' { '\'' } else { c }
            } else {
                '_'
            }
        })
        .collect()
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
