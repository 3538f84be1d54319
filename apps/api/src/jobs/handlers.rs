//! Axum route handlers for the Jobs API: search, matching, compatibility,
//! market insights and scraping.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::handlers::load_user;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::compatibility::CompatibilityReport;
use crate::jobs::insights::{compute_market_insights, MarketInsights};
use crate::jobs::matcher::{rank_jobs, CandidateProfile, MatchWeights, RankedJob};
use crate::jobs::query::{self, JobFilters, Page};
use crate::jobs::scraper::upsert_jobs;
use crate::models::job::JobRow;
use crate::resume::store::get_owned_resume;
use crate::state::AppState;

/// Upper bound on jobs pulled into memory for ranking.
const MATCH_CANDIDATE_CAP: i64 = 500;
/// Upper bound on jobs aggregated for insights.
const INSIGHTS_CAP: i64 = 1000;
const DEFAULT_MATCH_LIMIT: usize = 20;
const MAX_MATCH_LIMIT: usize = 100;
const DEFAULT_TOP: usize = 10;
const MAX_TOP: usize = 50;
const DEFAULT_SCRAPE_LIMIT: usize = 20;
const MAX_SCRAPE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct MatchParams {
    pub resume_id: Option<Uuid>,
    pub min_score: Option<f64>,
    pub limit: Option<usize>,
    pub open_to_remote: Option<bool>,
    pub willing_to_relocate: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub profile: CandidateProfile,
    pub evaluated: usize,
    pub matches: Vec<RankedJob>,
}

#[derive(Debug, Deserialize)]
pub struct CompatibilityRequest {
    pub resume_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct InsightsParams {
    pub top: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub query: String,
    pub location: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub source: &'static str,
    pub fetched: usize,
    pub stored: u64,
}

async fn load_job(state: &AppState, job_id: Uuid) -> Result<JobRow, AppError> {
    query::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

fn validate_scrape(req: &ScrapeRequest) -> Result<(String, usize), AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let limit = req.limit.unwrap_or(DEFAULT_SCRAPE_LIMIT);
    if limit == 0 || limit > MAX_SCRAPE_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_SCRAPE_LIMIT}"
        )));
    }
    Ok((query.to_string(), limit))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Result<Json<Page<JobRow>>, AppError> {
    Ok(Json(query::search_jobs(&state.db, &filters).await?))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(load_job(&state, job_id).await?))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !query::delete_job(&state.db, job_id).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    info!(user_id = %auth.id, job_id = %job_id, "Deleted job");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs/matches
///
/// Ranks filtered jobs against the caller's resume (`resume_id`) or, when absent,
/// against their profile.
pub async fn handle_match_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<MatchParams>,
    Query(filters): Query<JobFilters>,
) -> Result<Json<MatchResponse>, AppError> {
    let mut profile = match params.resume_id {
        Some(resume_id) => {
            let resume = get_owned_resume(&state.db, auth.id, resume_id).await?;
            CandidateProfile::from_resume(&resume.parsed)
        }
        None => CandidateProfile::from_user(&load_user(&state, auth.id).await?),
    };
    if let Some(open) = params.open_to_remote {
        profile.open_to_remote = open;
    }
    if let Some(relocate) = params.willing_to_relocate {
        profile.willing_to_relocate = relocate;
    }

    let min_score = params.min_score.unwrap_or(0.0).clamp(0.0, 100.0);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_MATCH_LIMIT)
        .clamp(1, MAX_MATCH_LIMIT);

    let jobs = query::fetch_filtered(&state.db, &filters, MATCH_CANDIDATE_CAP).await?;
    let evaluated = jobs.len();
    let matches = rank_jobs(&profile, jobs, MatchWeights::default(), min_score, limit);

    info!(
        user_id = %auth.id,
        evaluated,
        returned = matches.len(),
        "Ranked job matches"
    );

    Ok(Json(MatchResponse {
        profile,
        evaluated,
        matches,
    }))
}

/// POST /api/v1/jobs/:id/compatibility
pub async fn handle_compatibility(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<CompatibilityRequest>,
) -> Result<Json<CompatibilityReport>, AppError> {
    let job = load_job(&state, job_id).await?;
    let resume = get_owned_resume(&state.db, auth.id, req.resume_id).await?;

    let report = state
        .compatibility
        .analyze(&resume.parsed, &resume.raw_text, &job)
        .await?;

    info!(
        user_id = %auth.id,
        job_id = %job_id,
        score = report.compatibility_score,
        backend = %report.analyzer_backend,
        "Compatibility analysed"
    );
    Ok(Json(report))
}

/// GET /api/v1/jobs/insights
pub async fn handle_insights(
    State(state): State<AppState>,
    Query(params): Query<InsightsParams>,
    Query(filters): Query<JobFilters>,
) -> Result<Json<MarketInsights>, AppError> {
    let top = params.top.unwrap_or(DEFAULT_TOP).clamp(1, MAX_TOP);
    let jobs = query::fetch_filtered(&state.db, &filters, INSIGHTS_CAP).await?;
    Ok(Json(compute_market_insights(&jobs, top)))
}

/// POST /api/v1/jobs/scrape
pub async fn handle_scrape(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let (search, limit) = validate_scrape(&req)?;
    let source = state.job_source.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("job scraping is not configured (SERPAPI_KEY)".to_string())
    })?;

    let jobs = source
        .search(&search, req.location.as_deref(), limit)
        .await?;
    let stored = upsert_jobs(&state.db, &jobs).await?;

    info!(
        user_id = %auth.id,
        source = source.name(),
        query = %search,
        fetched = jobs.len(),
        stored,
        "Scrape complete"
    );

    Ok(Json(ScrapeResponse {
        source: source.name(),
        fetched: jobs.len(),
        stored,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrape(query: &str, limit: Option<usize>) -> ScrapeRequest {
        ScrapeRequest {
            query: query.to_string(),
            location: None,
            limit,
        }
    }

    #[test]
    fn test_validate_scrape_defaults() {
        let (query, limit) = validate_scrape(&scrape("  rust developer ", None)).unwrap();
        assert_eq!(query, "rust developer");
        assert_eq!(limit, DEFAULT_SCRAPE_LIMIT);
    }

    #[test]
    fn test_validate_scrape_rejects_bad_input() {
        assert!(validate_scrape(&scrape("  ", None)).is_err());
        assert!(validate_scrape(&scrape("rust", Some(0))).is_err());
        assert!(validate_scrape(&scrape("rust", Some(MAX_SCRAPE_LIMIT + 1))).is_err());
        assert!(validate_scrape(&scrape("rust", Some(MAX_SCRAPE_LIMIT))).is_ok());
    }
}
