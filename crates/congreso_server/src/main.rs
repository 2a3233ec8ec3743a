//! congreso_server — registration form backend and organiser dashboard.
//!
//! See `config.rs` for the environment variables it reads.

use std::sync::Arc;

use anyhow::Context;
use congreso_core::catalog::LocationCatalog;
use congreso_core::memory::MemoryRegistrationStore;
use congreso_core::service::RegistrationService;
use congreso_core::session::SessionGate;
use congreso_core::store::RegistrationStore;
use congreso_postgres::PgRegistrationStore;
use congreso_server::config::ServerConfig;
use congreso_server::router::build_router;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,congreso_server=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => LocationCatalog::from_path(path)
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => LocationCatalog::builtin().context("loading built-in catalog")?,
    };
    let catalog = Arc::new(catalog);
    tracing::info!(
        districts = catalog.list_districts().len(),
        expandable = catalog.expandable_district(),
        "location catalog ready"
    );

    let store: Arc<dyn RegistrationStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .context("failed to connect to database")?;
            tracing::info!("Connected to database");
            Arc::new(PgRegistrationStore::new(pool))
        }
        None => {
            tracing::warn!("CONGRESO_DATABASE_URL not set; registrations live in memory only");
            Arc::new(MemoryRegistrationStore::new())
        }
    };

    let service = Arc::new(
        RegistrationService::new(Arc::clone(&catalog), store).with_utc_offset(config.utc_offset),
    );
    let gate = Arc::new(SessionGate::new(&config.passphrase, config.session_ttl));

    let app = build_router(service, gate).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    );

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("congreso_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
