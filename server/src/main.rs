//! Canvas relay server.
//!
//! Hosts named boards over a single websocket endpoint. Each board keeps an
//! in-memory object snapshot so joining clients start from a full sync.

mod config;
mod frame;
mod routes;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

use crate::config::RelayConfig;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let config = RelayConfig::from_env();
    let addr = config.listen_addr();
    let state = state::AppState::new(config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "canvas relay listening");
    axum::serve(listener, app).await
}
