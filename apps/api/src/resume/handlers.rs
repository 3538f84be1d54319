//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummaryRow};
use crate::resume::parser::parse_resume_text;
use crate::resume::pdf::{extract_pdf_text, looks_like_pdf};
use crate::resume::store;
use crate::state::AppState;

/// Resumes longer than this are almost certainly not resumes.
const MAX_RESUME_CHARS: usize = 100_000;
const DEFAULT_TITLE: &str = "Untitled resume";

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub text: String,
    pub title: Option<String>,
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("resume text cannot be empty".to_string()));
    }
    if text.chars().count() > MAX_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "resume text exceeds {MAX_RESUME_CHARS} characters"
        )));
    }
    Ok(())
}

fn clean_title(title: Option<&str>) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.chars().take(200).collect())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

async fn store_parsed(
    state: &AppState,
    user_id: Uuid,
    title: String,
    text: String,
) -> Result<ResumeRow, AppError> {
    validate_text(&text)?;
    let parsed = parse_resume_text(&text);
    let row = store::insert_resume(&state.db, user_id, &title, &text, &parsed).await?;
    info!(
        user_id = %user_id,
        resume_id = %row.id,
        skills = parsed.skills.len(),
        "Stored parsed resume"
    );
    Ok(row)
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let title = clean_title(req.title.as_deref());
    let row = store_parsed(&state, auth.id, title, req.text).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/resumes/upload
///
/// Multipart upload with a `file` field (PDF or plain text) and an optional `title` field.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let mut title: Option<String> = None;
    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read file: {e}")))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            Some("title") => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("invalid title: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;

    let text = if looks_like_pdf(&bytes, filename.as_deref(), content_type.as_deref()) {
        extract_pdf_text(bytes).await?
    } else {
        String::from_utf8(bytes).map_err(|_| {
            AppError::Validation("file must be a PDF or UTF-8 text".to_string())
        })?
    };

    let title = clean_title(title.as_deref().or(filename.as_deref()));
    let row = store_parsed(&state, auth.id, title, text).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ResumeSummaryRow>>, AppError> {
    Ok(Json(store::list_resumes(&state.db, auth.id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(
        store::get_owned_resume(&state.db, auth.id, resume_id).await?,
    ))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store::delete_owned_resume(&state.db, auth.id, resume_id).await?;
    info!(user_id = %auth.id, resume_id = %resume_id, "Deleted resume");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_defaults() {
        assert_eq!(clean_title(None), DEFAULT_TITLE);
        assert_eq!(clean_title(Some("   ")), DEFAULT_TITLE);
        assert_eq!(clean_title(Some(" Backend CV ")), "Backend CV");
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("  \n ").is_err());
        assert!(validate_text("Jane Doe\nPython").is_ok());
        assert!(validate_text(&"a".repeat(MAX_RESUME_CHARS + 1)).is_err());
    }
}
