use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::server::AppState;

/// Password check against `server.password`. An empty configured password
/// leaves the API open (the storefront default).
pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = &state.config.server.password;
    if expected.is_empty() {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth) if auth == expected => Ok(next.run(req).await),
        Some(_) => {
            warn!("REST Authorization failed: Invalid password");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            warn!("REST Authorization failed: Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Demoforge-Api-Version", HeaderValue::from_static("1"));
    response
}
