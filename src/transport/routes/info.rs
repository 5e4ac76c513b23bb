use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
};
use serde::Serialize;

use crate::monitoring;
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub version: Version,
    pub build_time: u64,
    pub git: GitInfo,
    pub engine: EngineInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub semver: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    pub branch: String,
    pub commit: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    pub kind: &'static str,
    pub state: crate::demo::EngineState,
}

/// GET /v1/info
pub async fn get_info(State(state): State<Arc<AppState>>) -> Json<Info> {
    let version_str = env!("CARGO_PKG_VERSION");
    let mut parts = version_str.split('.');
    let major = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts
        .next()
        .and_then(|s| {
            s.split('-')
                .next()
                .and_then(|s| s.split('+').next())
                .and_then(|s| s.parse().ok())
        })
        .unwrap_or(0);

    Json(Info {
        version: Version {
            semver: version_str.to_string(),
            major,
            minor,
            patch,
        },
        build_time: option_env!("BUILD_TIME")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        git: GitInfo {
            branch: option_env!("GIT_BRANCH").unwrap_or("unknown").to_string(),
            commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
        },
        engine: EngineInfo {
            kind: "ffmpeg",
            state: state.engines.state(),
        },
    })
}

/// GET /v1/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<monitoring::Stats> {
    Json(monitoring::collect_stats(&state))
}

/// GET /version
pub async fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
