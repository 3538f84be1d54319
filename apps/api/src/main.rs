mod auth;
mod config;
mod db;
mod errors;
mod external;
mod footprint;
mod interview;
mod jobs;
mod models;
mod resume;
mod routes;
mod skills;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::external::ExternalClient;
use crate::jobs::compatibility::{CompatibilityAnalyzer, HeuristicCompatibilityAnalyzer};
use crate::jobs::scraper::{JobSource, SerpApiJobSource};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting UtopiaHire API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Outbound HTTP shared by the scraper and footprint scanners
    let http = ExternalClient::new()?;

    let compatibility: Arc<dyn CompatibilityAnalyzer> = Arc::new(HeuristicCompatibilityAnalyzer);

    let job_source: Option<Arc<dyn JobSource>> = match config.serpapi_key.clone() {
        Some(key) => {
            info!("Job scraping enabled (SerpAPI)");
            Some(Arc::new(SerpApiJobSource::new(http.clone(), key)))
        }
        None => {
            warn!("SERPAPI_KEY not set; job scraping disabled");
            None
        }
    };

    let state = AppState {
        db,
        config: config.clone(),
        http,
        compatibility,
        job_source,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
