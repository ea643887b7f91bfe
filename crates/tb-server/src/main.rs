//! Taskboard RS Server
//!
//! HTTP server exposing the task list, kanban board and statistics views.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tb_api::AppState;
use tb_core::config::{AppConfig, CompanySelectionStore};
use tb_db::{Backend, Database, MemoryBackend, PgBackend};
use tb_services::ChangeFeed;

mod health;

use health::{HealthChecker, HealthConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        AppConfig::default()
    });

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        "Starting Taskboard RS"
    );

    let db = match Database::connect(&config.database).await {
        Ok(db) => {
            info!("Connected to database");
            Some(db)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to database: {}. Running on the in-memory backend.",
                e
            );
            None
        }
    };

    let backend: Arc<dyn Backend> = match &db {
        Some(db) => Arc::new(PgBackend::from_database(db)),
        None => Arc::new(MemoryBackend::new()),
    };

    let feed = ChangeFeed::new(config.state.realtime_buffer);
    let selection = CompanySelectionStore::new(&config.state.path);
    let selected = selection.selected_company().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not read company selection");
        None
    });

    let app_state = AppState::new(backend, feed.clone()).with_selection(selection);

    // Load the previously selected company in the background
    if let Some(company_id) = selected {
        let state = app_state.clone();
        tokio::spawn(async move {
            state.company(company_id).await;
            info!(%company_id, "Restored company selection");
        });
    }

    let mut checker = HealthChecker::new(HealthConfig::default()).with_feed(feed);
    if let Some(db) = &db {
        checker = checker.with_database(db.clone());
    }

    let app = build_router(
        app_state,
        Arc::new(checker),
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let addr = config.server_addr();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        db.close().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "info,tb_server=debug,tb_api=debug,tb_services=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// Build the application router
fn build_router(state: AppState, checker: Arc<HealthChecker>, timeout: Duration) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::health))
        .with_state(checker);

    Router::new()
        .merge(health_routes)
        .merge(tb_api::router().with_state(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
