use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON error body returned by every failing endpoint: `{ "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
  pub error: String,
  #[serde(skip)]
  pub status: StatusCode,
}

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self {
      error: message.into(),
      status,
    }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(StatusCode::NOT_FOUND, message)
  }

  pub fn internal(message: impl Into<String>) -> Self {
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status;
    (status, Json(self)).into_response()
  }
}
