//! Axum route handlers for interview sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::handlers::load_user;
use crate::auth::AuthUser;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::interview::questions::{select_questions, seed_from_id, MAX_QUESTIONS, MIN_QUESTIONS};
use crate::interview::scorer::{score_answer, summarize};
use crate::interview::store;
use crate::jobs::matcher::ExperienceLevel;
use crate::models::interview::{InterviewAnswerRow, InterviewSessionRow};
use crate::state::AppState;

const DEFAULT_QUESTION_COUNT: usize = 5;
const MAX_ROLE_CHARS: usize = 100;
const MAX_ANSWER_CHARS: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub role: String,
    pub level: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: InterviewSessionRow,
    pub answers: Vec<InterviewAnswerRow>,
}

fn validate_start(req: &StartSessionRequest) -> Result<(String, usize), AppError> {
    let role = req.role.trim();
    if role.is_empty() || role.chars().count() > MAX_ROLE_CHARS {
        return Err(AppError::Validation(format!(
            "role must be between 1 and {MAX_ROLE_CHARS} characters"
        )));
    }
    let count = req.count.unwrap_or(DEFAULT_QUESTION_COUNT);
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
        return Err(AppError::Validation(format!(
            "count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}"
        )));
    }
    Ok((role.to_string(), count))
}

fn validate_answer(answer: &str) -> Result<(), AppError> {
    if answer.chars().count() > MAX_ANSWER_CHARS {
        return Err(AppError::Validation(format!(
            "answer exceeds {MAX_ANSWER_CHARS} characters"
        )));
    }
    Ok(())
}

/// Explicit level, then the role title, then the user's years of experience.
async fn resolve_level(
    state: &AppState,
    user_id: Uuid,
    requested: Option<&str>,
    role: &str,
) -> Result<ExperienceLevel, AppError> {
    if let Some(raw) = requested {
        return ExperienceLevel::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("unknown level '{raw}'")));
    }
    if let Some(level) = ExperienceLevel::parse(role) {
        return Ok(level);
    }
    let user = load_user(state, user_id).await?;
    Ok(user
        .years_experience
        .map(ExperienceLevel::from_years)
        .unwrap_or(ExperienceLevel::Mid))
}

/// POST /api/v1/interviews
pub async fn handle_start_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let (role, count) = validate_start(&req)?;
    let level = resolve_level(&state, auth.id, req.level.as_deref(), &role).await?;

    let session_id = Uuid::new_v4();
    let questions = select_questions(&role, level, count, seed_from_id(session_id));
    let session = store::insert_session(
        &state.db,
        session_id,
        auth.id,
        &role,
        level.as_str(),
        &questions,
    )
    .await?;

    info!(
        user_id = %auth.id,
        session_id = %session_id,
        level = level.as_str(),
        questions = questions.len(),
        "Started interview session"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionView {
            session,
            answers: vec![],
        }),
    ))
}

/// GET /api/v1/interviews
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InterviewSessionRow>>, AppError> {
    Ok(Json(store::list_sessions(&state.db, auth.id).await?))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = store::get_owned_session(&state.db, auth.id, session_id).await?;
    let answers = store::list_answers(&state.db, session_id).await?;
    Ok(Json(SessionView { session, answers }))
}

/// POST /api/v1/interviews/:id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<(StatusCode, Json<InterviewAnswerRow>), AppError> {
    validate_answer(&req.answer)?;
    let session = store::get_owned_session(&state.db, auth.id, session_id).await?;
    if session.is_completed() {
        return Err(AppError::Conflict(
            "interview session is already completed".to_string(),
        ));
    }
    let question = session.question(&req.question_id).ok_or_else(|| {
        AppError::NotFound(format!("Question {} not in this session", req.question_id))
    })?;

    let feedback = score_answer(question, &req.answer);
    let row = store::insert_answer(
        &state.db,
        session_id,
        &question.id,
        req.answer.trim(),
        &feedback,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("question {} was already answered", req.question_id))
        } else {
            AppError::Database(e)
        }
    })?;

    info!(
        user_id = %auth.id,
        session_id = %session_id,
        question_id = %req.question_id,
        score = feedback.overall,
        "Scored interview answer"
    );
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/interviews/:id/complete
pub async fn handle_complete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = store::get_owned_session(&state.db, auth.id, session_id).await?;
    if session.is_completed() {
        return Err(AppError::Conflict(
            "interview session is already completed".to_string(),
        ));
    }

    let answers = store::list_answers(&state.db, session_id).await?;
    let scored: Vec<_> = answers
        .iter()
        .map(|a| (a.question_id.clone(), a.feedback.0.clone()))
        .collect();
    let summary = summarize(&session.questions, &scored);

    // A concurrent completion wins the conditional update; report it as a conflict.
    let session = store::complete_session(&state.db, session_id, &summary)
        .await?
        .ok_or_else(|| AppError::Conflict("interview session is already completed".to_string()))?;

    info!(
        user_id = %auth.id,
        session_id = %session_id,
        average = summary.average_score,
        "Completed interview session"
    );
    Ok(Json(SessionView { session, answers }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(role: &str, count: Option<usize>) -> StartSessionRequest {
        StartSessionRequest {
            role: role.to_string(),
            level: None,
            count,
        }
    }

    #[test]
    fn test_validate_start() {
        assert_eq!(
            validate_start(&start(" Backend Engineer ", None)).unwrap(),
            ("Backend Engineer".to_string(), DEFAULT_QUESTION_COUNT)
        );
        assert!(validate_start(&start("", None)).is_err());
        assert!(validate_start(&start("SWE", Some(0))).is_err());
        assert!(validate_start(&start("SWE", Some(11))).is_err());
        assert!(validate_start(&start(&"x".repeat(MAX_ROLE_CHARS + 1), None)).is_err());
    }

    #[test]
    fn test_validate_answer_length() {
        assert!(validate_answer("short").is_ok());
        assert!(validate_answer(&"a".repeat(MAX_ANSWER_CHARS + 1)).is_err());
    }
}
