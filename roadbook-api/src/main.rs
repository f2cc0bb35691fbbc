use std::net::SocketAddr;
use std::sync::Arc;

use roadbook_api::{
    app,
    state::{AppState, AuthConfig},
};
use roadbook_core::provider::OfflineProvider;
use roadbook_store::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadbook_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = roadbook_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Roadbook API on port {}", config.server.port);

    let state = AppState::new(
        MemoryStore::new(),
        Arc::new(OfflineProvider),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
