use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower_http::cors::CorsLayer;

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{browse, demo, info},
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/demo", get(demo::generate_demo))
        .route("/demo/progress", get(demo::demo_progress))
        .route("/drives", get(browse::list_drives))
        .route("/drives/{drive_id}/folders", get(browse::list_folders))
        .route("/folders/{folder_id}/files", get(browse::list_files))
        .route("/search", get(browse::search))
        .route("/info", get(info::get_info))
        .route("/stats", get(info::get_stats));

    Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        // The storefront UI is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
