// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use dashboard_grid::application::dashboard_catalog::DashboardCatalog;
use dashboard_grid::application::dashboard_repository::DashboardRepository;
use dashboard_grid::application::session::SessionOptions;
use dashboard_grid::application::session_registry::SessionRegistry;
use dashboard_grid::application::timer::TokioTimer;
use dashboard_grid::infrastructure::chart_registry::InMemoryChartRegistry;
use dashboard_grid::infrastructure::config::{StorageKind, load_app_config, load_charts_config};
use dashboard_grid::infrastructure::file_repository::FileDashboardRepository;
use dashboard_grid::infrastructure::memory_repository::InMemoryDashboardRepository;
use dashboard_grid::presentation::app_state::AppState;
use dashboard_grid::presentation::router::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let charts_config = load_charts_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn DashboardRepository> = match app_config.storage.kind {
        StorageKind::Memory => Arc::new(InMemoryDashboardRepository::new()),
        StorageKind::File => {
            let repository = FileDashboardRepository::open(&app_config.storage.path).await?;
            tracing::info!("Storing dashboards under {}", repository.root().display());
            Arc::new(repository)
        }
    };
    let charts = Arc::new(InMemoryChartRegistry::new(charts_config.charts));
    tracing::info!(
        "Storage: {:?}, {} charts registered",
        app_config.storage.kind,
        charts.len()
    );

    // Create services (application layer)
    let catalog = DashboardCatalog::new(repository.clone(), app_config.grid.default_layout());
    let sessions = SessionRegistry::new(
        repository,
        charts,
        Arc::new(TokioTimer::new()),
        SessionOptions {
            cell_size_px: app_config.grid.cell_size_px,
            debounce: app_config.persistence.debounce(),
        },
    );

    // Create application state
    let state = Arc::new(AppState {
        catalog,
        sessions: sessions.clone(),
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_addr))?;
    tracing::info!("Starting dashboard-grid service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush-on-teardown for every open dashboard
    sessions.close_all().await;
    tracing::info!("All sessions flushed, exiting");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
