use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::resume::parser::ParsedResume;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub raw_text: String,
    pub parsed: Json<ParsedResume>,
    pub created_at: DateTime<Utc>,
}

/// Listing view of a resume, without the raw text.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub parsed: Json<ParsedResume>,
    pub created_at: DateTime<Utc>,
}
