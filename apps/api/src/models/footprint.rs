use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::footprint::metrics::FootprintReport;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FootprintScanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub github_username: Option<String>,
    pub stackoverflow_user_id: Option<i64>,
    pub visibility_score: f64,
    pub privacy_risk_score: f64,
    pub report: Json<FootprintReport>,
    pub created_at: DateTime<Utc>,
}
