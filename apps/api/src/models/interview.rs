use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::interview::questions::Question;
use crate::interview::scorer::{AnswerScore, SessionSummary};

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub level: String,
    pub questions: Json<Vec<Question>>,
    pub status: String,
    pub overall_score: Option<f64>,
    pub summary: Option<Json<SessionSummary>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewSessionRow {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewAnswerRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_id: String,
    pub answer: String,
    pub score: f64,
    pub feedback: Json<AnswerScore>,
    pub created_at: DateTime<Utc>,
}
