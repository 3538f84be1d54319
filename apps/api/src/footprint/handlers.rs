//! Axum route handlers for footprint scans.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::external::ExternalApiError;
use crate::footprint::github::{is_valid_login, GitHubClient, GitHubRepo, GitHubUser};
use crate::footprint::metrics::{build_report, StackOverflowProfile};
use crate::footprint::stackoverflow::StackOverflowClient;
use crate::models::footprint::FootprintScanRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub github_username: Option<String>,
    pub stackoverflow_user_id: Option<i64>,
}

/// Normalises the request: blank usernames count as absent.
fn validate_scan(req: &ScanRequest) -> Result<(Option<String>, Option<i64>), AppError> {
    let github = req
        .github_username
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if github.is_none() && req.stackoverflow_user_id.is_none() {
        return Err(AppError::Validation(
            "provide github_username or stackoverflow_user_id".to_string(),
        ));
    }
    if let Some(login) = &github {
        if !is_valid_login(login) {
            return Err(AppError::Validation(format!(
                "'{login}' is not a valid GitHub username"
            )));
        }
    }
    if let Some(id) = req.stackoverflow_user_id {
        if id <= 0 {
            return Err(AppError::Validation(
                "stackoverflow_user_id must be positive".to_string(),
            ));
        }
    }
    Ok((github, req.stackoverflow_user_id))
}

async fn fetch_github(
    client: &GitHubClient,
    login: Option<&str>,
) -> Result<Option<(GitHubUser, Vec<GitHubRepo>)>, ExternalApiError> {
    let Some(login) = login else {
        return Ok(None);
    };
    let (user, repos) = tokio::try_join!(client.fetch_user(login), client.fetch_repos(login))?;
    Ok(Some((user, repos)))
}

async fn fetch_stackoverflow(
    client: &StackOverflowClient,
    user_id: Option<i64>,
) -> Result<Option<StackOverflowProfile>, ExternalApiError> {
    let Some(id) = user_id else {
        return Ok(None);
    };
    let (user, answer_count, top_tags) = tokio::try_join!(
        client.fetch_user(id),
        client.fetch_answer_count(id),
        client.fetch_top_tags(id)
    )?;
    Ok(Some(StackOverflowProfile {
        user,
        answer_count,
        top_tags,
    }))
}

/// POST /api/v1/footprint/scan
pub async fn handle_scan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ScanRequest>,
) -> Result<(StatusCode, Json<FootprintScanRow>), AppError> {
    let (github_login, so_id) = validate_scan(&req)?;

    let github_client = GitHubClient::new(state.http.clone(), state.config.github_token.clone());
    let so_client = StackOverflowClient::new(state.http.clone());

    let (github, stackoverflow) = tokio::join!(
        fetch_github(&github_client, github_login.as_deref()),
        fetch_stackoverflow(&so_client, so_id)
    );
    let github = github?;
    let stackoverflow = stackoverflow?;

    let report = build_report(
        github.as_ref().map(|(user, repos)| (user, repos.as_slice())),
        stackoverflow.as_ref(),
        Utc::now(),
    );

    let row = sqlx::query_as::<_, FootprintScanRow>(
        r#"
        INSERT INTO footprint_scans
            (id, user_id, github_username, stackoverflow_user_id, visibility_score, privacy_risk_score, report)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.id)
    .bind(&github_login)
    .bind(so_id)
    .bind(report.visibility_score)
    .bind(report.privacy_risk_score)
    .bind(SqlJson(&report))
    .fetch_one(&state.db)
    .await?;

    info!(
        user_id = %auth.id,
        scan_id = %row.id,
        visibility = report.visibility_score,
        privacy_risk = report.privacy_risk_score,
        "Footprint scan stored"
    );
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/footprint/scans
pub async fn handle_list_scans(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FootprintScanRow>>, AppError> {
    let scans = sqlx::query_as::<_, FootprintScanRow>(
        "SELECT * FROM footprint_scans WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(scans))
}

/// GET /api/v1/footprint/scans/:id
pub async fn handle_get_scan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<FootprintScanRow>, AppError> {
    sqlx::query_as::<_, FootprintScanRow>(
        "SELECT * FROM footprint_scans WHERE id = $1 AND user_id = $2",
    )
    .bind(scan_id)
    .bind(auth.id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| AppError::NotFound(format!("Footprint scan {scan_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(github: Option<&str>, so: Option<i64>) -> ScanRequest {
        ScanRequest {
            github_username: github.map(str::to_string),
            stackoverflow_user_id: so,
        }
    }

    #[test]
    fn test_requires_at_least_one_platform() {
        assert!(validate_scan(&req(None, None)).is_err());
        assert!(validate_scan(&req(Some("  "), None)).is_err());
    }

    #[test]
    fn test_trims_and_validates_login() {
        assert_eq!(
            validate_scan(&req(Some(" octocat "), None)).unwrap(),
            (Some("octocat".to_string()), None)
        );
        assert!(validate_scan(&req(Some("../admin"), None)).is_err());
    }

    #[test]
    fn test_rejects_non_positive_so_id() {
        assert!(validate_scan(&req(None, Some(0))).is_err());
        assert_eq!(validate_scan(&req(None, Some(22656))).unwrap(), (None, Some(22656)));
    }
}
