use std::net::{IpAddr, SocketAddr};

use demoforge::common::logger;
use demoforge::configs::Config;
use demoforge::server::AppState;
use demoforge::transport;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::load()?;
    logger::init(&config);

    let state = AppState::new(config.clone())?;

    let app = transport::http_server::router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let host: IpAddr = config.server.host.parse()?;
    let address = SocketAddr::from((host, config.server.port));
    info!("Demoforge listening on {}", address);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
