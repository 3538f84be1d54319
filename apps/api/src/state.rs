use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::external::ExternalClient;
use crate::jobs::compatibility::CompatibilityAnalyzer;
use crate::jobs::scraper::JobSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Outbound HTTP for GitHub and StackExchange.
    pub http: ExternalClient,
    /// Pluggable compatibility backend. Default: HeuristicCompatibilityAnalyzer.
    pub compatibility: Arc<dyn CompatibilityAnalyzer>,
    /// `None` when SERPAPI_KEY is unset; scraping then answers 503.
    pub job_source: Option<Arc<dyn JobSource>>,
}
