//! remitsum server entry point.
//!
//! Starts the Axum HTTP server over either the in-memory stores or
//! PostgreSQL, per configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use remitsum::api;
use remitsum::app_state::AppState;
use remitsum::config::EngineConfig;
use remitsum::domain::EventBus;
use remitsum::persistence::{LedgerStore, MemoryStore, PostgresStore, SummaryStore};
use remitsum::service::{ChangeDispatcher, DispatchSettings, SummaryService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = EngineConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting remitsum");

    // Build store layer
    let (ledger, summaries): (Arc<dyn LedgerStore>, Arc<dyn SummaryStore>) =
        if config.persistence_enabled {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
                .connect(&config.database_url)
                .await?;
            tracing::info!("connected to PostgreSQL");
            let store = Arc::new(PostgresStore::new(pool));
            (Arc::clone(&store) as Arc<dyn LedgerStore>, store as Arc<dyn SummaryStore>)
        } else {
            tracing::warn!("persistence disabled, using in-memory stores");
            let store = Arc::new(MemoryStore::new());
            (Arc::clone(&store) as Arc<dyn LedgerStore>, store as Arc<dyn SummaryStore>)
        };

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let summary_service = Arc::new(SummaryService::new(ledger, summaries, event_bus));
    let dispatcher = ChangeDispatcher::new(
        Arc::clone(&summary_service),
        DispatchSettings {
            queue_capacity: config.dispatch_queue_capacity,
            max_concurrent: config.dispatch_max_concurrent,
            refresh_timeout: Duration::from_secs(config.refresh_timeout_secs),
            retry_max: config.refresh_retry_max,
            retry_base_delay: Duration::from_millis(config.refresh_retry_base_ms),
        },
    );

    // Build application state
    let app_state = AppState {
        summary_service,
        dispatcher,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
