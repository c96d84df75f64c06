//! Fitbook booking service HTTP server.

use anyhow::Context;
use booking::{
    config::Config,
    metrics,
    server::{self, AppState, build_router},
};
use fitbook_core::environment::SystemClock;
use fitbook_postgres::{PostgresEntityStore, PostgresIdentityVerifier};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking=info,fitbook_postgres=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fitbook booking server");

    let config = Config::load();
    info!(
        host = %config.server.host,
        port = config.server.port,
        default_max_participants = config.booking.default_max_participants,
        "Configuration loaded"
    );

    let metrics_addr: SocketAddr = config
        .server
        .metrics_address()
        .parse()
        .context("Invalid METRICS_HOST/METRICS_PORT")?;
    metrics::install_prometheus(metrics_addr).context("Failed to install Prometheus exporter")?;
    metrics::register_business_metrics();

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout())
        .connect(&config.postgres.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let store = PostgresEntityStore::from_pool(pool.clone());
    if config.postgres.run_migrations {
        info!("Running database migrations...");
        store.migrate().await.context("Failed to run migrations")?;
    }

    let state = AppState::new(
        Arc::new(store),
        Arc::new(PostgresIdentityVerifier::new(pool)),
        Arc::new(SystemClock),
        config.booking,
    );
    let app = build_router(state);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    server::serve(listener, app, config.server.shutdown_timeout()).await?;

    info!("Server stopped");
    Ok(())
}
