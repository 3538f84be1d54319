use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub skills: Vec<String>,
    pub apply_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

/// A normalised job ready to be upserted into `jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub is_remote: bool,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub skills: Vec<String>,
    pub apply_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}
