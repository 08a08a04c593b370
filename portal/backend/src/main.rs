//! Patient Portal API Backend
//!
//! Bootstrap: configuration, stores and clients, the startup user sync, then
//! the HTTP server.

use medportal_auth::{AuthProvider, AuthStore, InMemoryAuthStore, LocalAuthProvider};
use medportal_common::{HttpProvisioningClient, PortalConfig, ProvisioningApi};
use medportal_signup::{LocalImageStorage, SignUpFlow};
use medportal_sync::{SyncGate, UserSyncService};
use portal_api::{build_router, AppState};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("MEDPORTAL_CONFIG").unwrap_or_else(|_| "config/portal".into());
    let config = PortalConfig::load(&config_path)?;
    tracing::info!("Loaded configuration: {:?}", config);

    let auth_store: Arc<dyn AuthStore> = Arc::new(InMemoryAuthStore::new());
    let auth: Arc<dyn AuthProvider> = Arc::new(
        LocalAuthProvider::new(auth_store.clone(), config.session.secret.as_bytes())
            .with_session_ttl(config.session.ttl()),
    );
    let backend: Arc<dyn ProvisioningApi> = Arc::new(HttpProvisioningClient::new(
        &config.backend.base_url,
        config.backend.api_keys(),
        config.backend.timeout(),
    )?);
    let images = Arc::new(LocalImageStorage::new(
        &config.storage.base_path,
        &config.storage.public_url,
    ));

    let flow = Arc::new(
        SignUpFlow::new(auth.clone(), backend.clone(), images, config.signup.call_timeout())
            .with_provisioned_retention(config.signup.provisioned_retention()),
    );
    let sync = Arc::new(SyncGate::new(Arc::new(UserSyncService::new(
        auth_store, backend,
    ))));

    let state = AppState::new(&config, flow, auth, sync.clone())?;

    tokio::spawn(async move {
        let outcome = sync.run_once().await;
        if let Some(report) = outcome.data() {
            tracing::info!(
                "Startup sync: {} validated, {} deleted, {} failed",
                report.validated,
                report.deleted,
                report.failed.len()
            );
        }
    });

    let mut app = build_router(state);
    if config.storage.public_url.starts_with('/') {
        app = app.nest_service(
            &config.storage.public_url,
            ServeDir::new(&config.storage.base_path),
        );
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!("Portal API listening on {}", config.server.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
