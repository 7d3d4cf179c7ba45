use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tokio::task::JoinHandle;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    error_handler::{error_middleware, handle_panic, route_not_found, ErrorPipeline},
    handlers::{self, AppState},
    ingestion::{CreateLogConsumer, IngestionQueue},
    metrics,
    services::LogService,
    signals::setup_signal_handlers,
    storage::{self, Storage},
};

/// Start the logging service
///
/// This function:
/// 1. Initializes metrics
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Opens storage and starts the ingestion worker
/// 4. Serves requests until a shutdown signal arrives
/// 5. Drains the ingestion queue
pub async fn start_server(config: Config) -> Result<()> {
    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let storage = storage::connect(&config.database).await?;
    let (app_state, ingestion_worker) = build_state(storage, &config);

    let app = create_router(app_state, &config, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting log service on {}", addr);
    info!(
        backend = ?config.database.backend,
        ingestion = config.ingestion.enabled,
        environment = %config.server.environment,
        "Configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // The router owns the last queue publishers; it is dropped when serve returns
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    if let Some(worker) = ingestion_worker {
        info!("Draining ingestion queue...");
        worker.await?;
    }

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Wire services over `storage`, spawning the ingestion worker when enabled
pub fn build_state(storage: Storage, config: &Config) -> (AppState, Option<JoinHandle<()>>) {
    if !config.ingestion.enabled {
        return (AppState::new(storage, None), None);
    }

    let consumer = CreateLogConsumer::new(LogService::new(&storage));
    let (queue, worker) = IngestionQueue::spawn(consumer, &config.ingestion);
    (AppState::new(storage, Some(queue)), Some(worker))
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    app_state: AppState,
    config: &Config,
    metrics_handle: Option<Arc<PrometheusHandle>>,
) -> Router {
    let mut api = Router::new()
        .merge(handlers::logs::log_routes())
        .merge(handlers::severities::severity_routes())
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    if let Some(queue) = app_state.ingestion.clone() {
        api = api.merge(
            Router::new()
                .route("/ingest/logs", post(handlers::ingest::publish_log))
                .with_state::<AppState>(queue),
        );
    }

    let mut app = api.fallback(route_not_found).with_state(app_state);

    if let Some(handle) = metrics_handle {
        app = app.merge(
            Router::new()
                .route(&config.metrics.endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        );
    }

    let pipeline = ErrorPipeline {
        expose_details: config.server.is_development(),
    };

    app.layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(pipeline, error_middleware))
        .layer(TraceLayer::new_for_http())
}
