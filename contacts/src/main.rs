mod config;
mod domains;
mod error;
mod handler;
mod http;
mod repositories;
mod server;
mod views;

use std::{process, sync::Arc};

use repositories::{memory::MemoryContactRepository, ContactRepository};
use server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "failed to load configuration");
            process::exit(1);
        }
    };
    tracing::debug!(?config, "loaded configuration");

    let repository = MemoryContactRepository::new();
    if let Err(err) = repository.initialize().await {
        tracing::error!(%err, "error loading contacts");
        process::exit(1);
    }

    let state = AppState {
        repository: Arc::new(repository),
    };

    let server = Server::new(
        state,
        handler::route_request,
        config.max_connections,
        config.request_timeout(),
    );

    tracing::info!("starting web server on {}: use Ctrl+C to stop", config.server_address);
    if let Err(err) = server.bind(config.server_address).await {
        tracing::error!(%err, "server failed");
        process::exit(1);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ContactRepository + Send + Sync>,
}
