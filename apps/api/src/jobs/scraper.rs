//! Job ingestion: pluggable job sources plus normalisation and upsert into `jobs`.
//!
//! The only built-in source is SerpAPI's Google Jobs engine. Raw postings are
//! normalised (level, remote flag, salary, skills, posting date) before storage.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::external::{ExternalApiError, ExternalClient};
use crate::jobs::matcher::{is_remote_location, ExperienceLevel};
use crate::models::job::NewJob;
use crate::skills::extract_skills;

const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const SERPAPI_SOURCE: &str = "serpapi";
/// Google Jobs returns ten results per page.
const MAX_PAGES: usize = 10;

const HOURS_PER_YEAR: f64 = 2080.0;
const DAYS_PER_YEAR: f64 = 260.0;

/// Implement this to add another job board.
#[async_trait]
pub trait JobSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        query: &str,
        location: Option<&str>,
        limit: usize,
    ) -> Result<Vec<NewJob>, ExternalApiError>;
}

// ────────────────────────────────────────────────────────────────────────────
// SerpAPI wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    jobs_results: Vec<SerpJob>,
    serpapi_pagination: Option<SerpPagination>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpPagination {
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SerpJob {
    title: String,
    company_name: Option<String>,
    location: Option<String>,
    #[serde(default)]
    description: String,
    job_id: Option<String>,
    #[serde(default)]
    detected_extensions: DetectedExtensions,
    #[serde(default)]
    apply_options: Vec<ApplyOption>,
    share_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetectedExtensions {
    posted_at: Option<String>,
    schedule_type: Option<String>,
    salary: Option<String>,
    work_from_home: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApplyOption {
    link: String,
}

pub struct SerpApiJobSource {
    http: ExternalClient,
    api_key: String,
}

impl SerpApiJobSource {
    pub fn new(http: ExternalClient, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl JobSource for SerpApiJobSource {
    fn name(&self) -> &'static str {
        SERPAPI_SOURCE
    }

    async fn search(
        &self,
        query: &str,
        location: Option<&str>,
        limit: usize,
    ) -> Result<Vec<NewJob>, ExternalApiError> {
        let now = Utc::now();
        let mut jobs: Vec<NewJob> = Vec::new();
        let mut next_page_token: Option<String> = None;

        for page in 0..MAX_PAGES {
            if jobs.len() >= limit {
                break;
            }

            let mut params: Vec<(&str, String)> = vec![
                ("engine", "google_jobs".to_string()),
                ("q", query.to_string()),
                ("api_key", self.api_key.clone()),
            ];
            if let Some(location) = location {
                params.push(("location", location.to_string()));
            }
            if let Some(token) = &next_page_token {
                params.push(("next_page_token", token.clone()));
            }

            let response: SerpApiResponse = self.http.get_json(SERPAPI_URL, &params, None).await?;

            if response.jobs_results.is_empty() {
                // SerpAPI reports "no results" as an `error` field on a 200 response.
                if let Some(error) = response.error {
                    debug!(page, error = %error, "SerpAPI returned no results");
                }
                break;
            }

            jobs.extend(
                response
                    .jobs_results
                    .into_iter()
                    .map(|raw| to_new_job(raw, SERPAPI_SOURCE, now)),
            );

            next_page_token = response.serpapi_pagination.and_then(|p| p.next_page_token);
            if next_page_token.is_none() {
                break;
            }
        }

        jobs.truncate(limit);
        info!(query, fetched = jobs.len(), "SerpAPI search complete");
        Ok(jobs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalisation
// ────────────────────────────────────────────────────────────────────────────

static SALARY_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kKmM]\b)?").unwrap());

static POSTED_AGO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+|an?)\+?\s*(minute|min|hour|day|week|month|year)s?\s+ago\b").unwrap()
});

static YEARS_REQUIRED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b").unwrap());

/// Parses a free-form salary into annual `(min, max)`.
///
/// Handles `K`/`M` suffixes, thousands separators and hourly / daily / weekly /
/// monthly periods. A single figure yields `min == max`.
pub fn parse_salary(raw: &str) -> Option<(f64, f64)> {
    let lower = raw.to_lowercase();
    let multiplier = if lower.contains("hour") || lower.contains("/hr") {
        HOURS_PER_YEAR
    } else if lower.contains("day") || lower.contains("daily") {
        DAYS_PER_YEAR
    } else if lower.contains("week") {
        52.0
    } else if lower.contains("month") {
        12.0
    } else {
        1.0
    };

    let values: Vec<f64> = SALARY_NUMBER_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
            let scale = match caps.get(2).map(|m| m.as_str()) {
                Some("k") | Some("K") => 1_000.0,
                Some("m") | Some("M") => 1_000_000.0,
                _ => 1.0,
            };
            Some(number * scale * multiplier)
        })
        .filter(|v| v.is_finite() && *v > 0.0)
        .take(2)
        .collect();

    match values.as_slice() {
        [single] => Some((*single, *single)),
        [a, b] => Some((a.min(*b), a.max(*b))),
        _ => None,
    }
}

/// Resolves "3 days ago" / "an hour ago" against `now`. Unknown formats give `None`.
pub fn parse_posted_ago(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = raw.trim().to_lowercase();
    if lower == "today" || lower == "just posted" || lower == "just now" {
        return Some(now);
    }
    if lower == "yesterday" {
        return Some(now - Duration::days(1));
    }

    let caps = POSTED_AGO_RE.captures(&lower)?;
    let amount: i64 = match caps.get(1)?.as_str() {
        "a" | "an" => 1,
        n => n.parse().ok()?,
    };
    let delta = match caps.get(2)?.as_str() {
        "minute" | "min" => Duration::minutes(amount),
        "hour" => Duration::hours(amount),
        "day" => Duration::days(amount),
        "week" => Duration::weeks(amount),
        "month" => Duration::days(30 * amount),
        "year" => Duration::days(365 * amount),
        _ => return None,
    };
    Some(now - delta)
}

/// Maps SerpAPI schedule types ("Full-time", "Contractor") onto stored job types.
pub fn normalize_job_type(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let normalized = if lower.contains("full") {
        "full_time".to_string()
    } else if lower.contains("part") {
        "part_time".to_string()
    } else if lower.contains("contract") {
        "contract".to_string()
    } else if lower.contains("intern") {
        "internship".to_string()
    } else if lower.contains("temp") {
        "temporary".to_string()
    } else {
        lower.replace([' ', '-'], "_")
    };
    Some(normalized)
}

pub fn infer_remote(title: &str, location: Option<&str>, description: &str, flagged: bool) -> bool {
    if flagged || is_remote_location(title) || location.is_some_and(is_remote_location) {
        return true;
    }
    let lower = description.to_lowercase();
    ["fully remote", "100% remote", "remote-first", "work from home", "remote position"]
        .iter()
        .any(|p| lower.contains(p))
}

/// Level words in the title win; otherwise the largest "N+ years" in the description.
pub fn infer_experience_level(title: &str, description: &str) -> Option<ExperienceLevel> {
    ExperienceLevel::parse(title).or_else(|| {
        YEARS_REQUIRED_RE
            .captures_iter(description)
            .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
            .filter(|y| *y <= 30.0)
            .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.max(y))))
            .map(ExperienceLevel::from_years)
    })
}

pub fn to_new_job(raw: SerpJob, source: &str, now: DateTime<Utc>) -> NewJob {
    let ext = raw.detected_extensions;
    let company = raw
        .company_name
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let location = raw.location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());

    let external_id = raw.job_id.unwrap_or_else(|| {
        format!(
            "{}|{}|{}",
            raw.title,
            company,
            location.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    });

    let salary = ext.salary.as_deref().and_then(parse_salary);
    let is_remote = infer_remote(
        &raw.title,
        location.as_deref(),
        &raw.description,
        ext.work_from_home.unwrap_or(false),
    );

    NewJob {
        source: source.to_string(),
        external_id,
        experience_level: infer_experience_level(&raw.title, &raw.description)
            .map(|l| l.as_str().to_string()),
        skills: extract_skills(&format!("{}\n{}", raw.title, raw.description)),
        job_type: ext.schedule_type.as_deref().and_then(normalize_job_type),
        posted_at: ext.posted_at.as_deref().and_then(|p| parse_posted_ago(p, now)),
        apply_url: raw
            .apply_options
            .into_iter()
            .map(|o| o.link)
            .next()
            .or(raw.share_link),
        salary_min: salary.map(|(lo, _)| lo),
        salary_max: salary.map(|(_, hi)| hi),
        is_remote,
        title: raw.title,
        company,
        location,
        description: raw.description,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Storage
// ────────────────────────────────────────────────────────────────────────────

const UPSERT_JOB_SQL: &str = r#"
    INSERT INTO jobs (
        id, source, external_id, title, company, location, description, job_type,
        experience_level, is_remote, salary_min, salary_max, skills, apply_url, posted_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    ON CONFLICT (source, external_id) DO UPDATE SET
        title = EXCLUDED.title,
        company = EXCLUDED.company,
        location = EXCLUDED.location,
        description = EXCLUDED.description,
        job_type = EXCLUDED.job_type,
        experience_level = EXCLUDED.experience_level,
        is_remote = EXCLUDED.is_remote,
        salary_min = EXCLUDED.salary_min,
        salary_max = EXCLUDED.salary_max,
        skills = EXCLUDED.skills,
        apply_url = EXCLUDED.apply_url,
        posted_at = COALESCE(EXCLUDED.posted_at, jobs.posted_at),
        scraped_at = now()
"#;

/// Number of values `upsert_jobs` binds per row.
const UPSERT_JOB_BINDS: usize = 15;

/// Inserts or refreshes each job keyed on `(source, external_id)`.
/// A refreshed row keeps its original id. Returns how many rows were written.
pub async fn upsert_jobs(pool: &PgPool, jobs: &[NewJob]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut stored = 0u64;

    for job in jobs {
        let result = sqlx::query(UPSERT_JOB_SQL)
            .bind(Uuid::new_v4())
            .bind(&job.source)
            .bind(&job.external_id)
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(&job.description)
            .bind(&job.job_type)
            .bind(&job.experience_level)
            .bind(job.is_remote)
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(&job.skills)
            .bind(&job.apply_url)
            .bind(job.posted_at)
            .execute(&mut *tx)
            .await?;
        stored += result.rows_affected();
    }

    tx.commit().await?;
    Ok(stored)
}
