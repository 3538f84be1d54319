use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::questions::Question;
use crate::interview::scorer::{AnswerScore, SessionSummary};
use crate::models::interview::{
    InterviewAnswerRow, InterviewSessionRow, STATUS_COMPLETED, STATUS_IN_PROGRESS,
};

pub async fn insert_session(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    role: &str,
    level: &str,
    questions: &[Question],
) -> Result<InterviewSessionRow, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        INSERT INTO interview_sessions (id, user_id, role, level, questions, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(role)
    .bind(level)
    .bind(Json(questions))
    .bind(STATUS_IN_PROGRESS)
    .fetch_one(pool)
    .await
}

pub async fn list_sessions(pool: &PgPool, user_id: Uuid) -> Result<Vec<InterviewSessionRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Loads a session owned by `user_id`. Other users' sessions are reported as missing.
pub async fn get_owned_session(
    pool: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<InterviewSessionRow, AppError> {
    sqlx::query_as::<_, InterviewSessionRow>(
        "SELECT * FROM interview_sessions WHERE id = $1 AND user_id = $2",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Interview session {session_id} not found")))
}

pub async fn list_answers(pool: &PgPool, session_id: Uuid) -> Result<Vec<InterviewAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewAnswerRow>(
        "SELECT * FROM interview_answers WHERE session_id = $1 ORDER BY created_at ASC",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_answer(
    pool: &PgPool,
    session_id: Uuid,
    question_id: &str,
    answer: &str,
    feedback: &AnswerScore,
) -> Result<InterviewAnswerRow, sqlx::Error> {
    sqlx::query_as::<_, InterviewAnswerRow>(
        r#"
        INSERT INTO interview_answers (id, session_id, question_id, answer, score, feedback)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(question_id)
    .bind(answer)
    .bind(feedback.overall)
    .bind(Json(feedback))
    .fetch_one(pool)
    .await
}

/// Marks the session completed. Returns `None` when it was already completed.
pub async fn complete_session(
    pool: &PgPool,
    session_id: Uuid,
    summary: &SessionSummary,
) -> Result<Option<InterviewSessionRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewSessionRow>(
        r#"
        UPDATE interview_sessions
        SET status = $2, overall_score = $3, summary = $4, completed_at = now()
        WHERE id = $1 AND status <> $2
        RETURNING *
        "#,
    )
    .bind(session_id)
    .bind(STATUS_COMPLETED)
    .bind(summary.average_score)
    .bind(Json(summary))
    .fetch_optional(pool)
    .await
}
