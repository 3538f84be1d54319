//! Axum route handlers for registration, login and profile management.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{hash_password_blocking, validate_password, verify_password_blocking};
use crate::auth::token::issue_token;
use crate::auth::AuthUser;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::user::{PublicUser, UserRow};
use crate::skills::normalize_skills;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: PublicUser,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub years_experience: Option<f64>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation helpers
// ────────────────────────────────────────────────────────────────────────────

/// Trims and lowercases an email, rejecting obviously malformed addresses.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let invalid = || AppError::Validation("email address is invalid".to_string());

    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(email)
}

fn validate_full_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 120 {
        return Err(AppError::Validation(
            "full_name must be between 1 and 120 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn validate_years(years: Option<f64>) -> Result<Option<f64>, AppError> {
    match years {
        Some(y) if !(0.0..=60.0).contains(&y) => Err(AppError::Validation(
            "years_experience must be between 0 and 60".to_string(),
        )),
        other => Ok(other),
    }
}

fn auth_response(state: &AppState, user: UserRow) -> Result<AuthResponse, AppError> {
    let token = issue_token(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_ttl_minutes,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("token issuance failed: {e}")))?;

    Ok(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: state.config.jwt_ttl_minutes * 60,
        user: user.into(),
    })
}

pub(crate) async fn load_user(state: &AppState, user_id: Uuid) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email)?;
    validate_password(&req.password)?;
    let full_name = validate_full_name(&req.full_name)?;

    let password_hash = hash_password_blocking(req.password).await?;

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, password_hash, full_name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .bind(&full_name)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("an account with this email already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    info!(user_id = %user.id, "Registered new user");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

/// POST /api/v1/auth/login
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password_blocking(req.password, user.password_hash.clone()).await {
        info!(user_id = %user.id, "Rejected login with bad password");
        return Err(AppError::Unauthorized);
    }

    info!(user_id = %user.id, "User logged in");
    Ok(Json(auth_response(&state, user)?))
}

/// GET /api/v1/auth/me
pub async fn handle_get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = load_user(&state, auth.id).await?;
    Ok(Json(user.into()))
}

/// PUT /api/v1/auth/me
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let full_name = req.full_name.as_deref().map(validate_full_name).transpose()?;
    let years_experience = validate_years(req.years_experience)?;
    let location = req
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    let skills = req.skills.map(|s| normalize_skills(&s));

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users SET
            full_name        = COALESCE($2, full_name),
            location         = COALESCE($3, location),
            years_experience = COALESCE($4, years_experience),
            skills           = COALESCE($5, skills),
            updated_at       = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth.id)
    .bind(full_name)
    .bind(location)
    .bind(years_experience)
    .bind(skills)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    info!(user_id = %user.id, "Updated profile");
    Ok(Json(user.into()))
}

/// POST /api/v1/auth/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_password(&req.new_password)?;

    let user = load_user(&state, auth.id).await?;
    if !verify_password_blocking(req.current_password, user.password_hash).await {
        return Err(AppError::Unauthorized);
    }

    let new_hash = hash_password_blocking(req.new_password).await?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(auth.id)
        .bind(new_hash)
        .execute(&state.db)
        .await?;

    info!(user_id = %auth.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  Amira@Example.COM ").unwrap(), "amira@example.com");
    }

    #[test]
    fn test_normalize_email_rejects_bad_shapes() {
        for bad in ["", "no-at-sign", "@example.com", "a@nodot", "a@.com", "a@b.", "a b@c.io", "a@b@c.io"] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_validate_full_name() {
        assert_eq!(validate_full_name("  Sam Lee ").unwrap(), "Sam Lee");
        assert!(validate_full_name("   ").is_err());
    }

    #[test]
    fn test_validate_years_bounds() {
        assert!(validate_years(Some(-1.0)).is_err());
        assert!(validate_years(Some(61.0)).is_err());
        assert_eq!(validate_years(Some(4.5)).unwrap(), Some(4.5));
        assert_eq!(validate_years(None).unwrap(), None);
    }
}
