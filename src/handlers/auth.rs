//! Authentication endpoints: login, token verification, password change.

use crate::auth::{hash_password, issue_token, verify_password, AdminClaims, Claims};
use crate::error::AppError;
use crate::models::{Admin, AdminPublic};
use crate::response::message;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AdminPublic,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: Claims,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = body.username.as_deref().unwrap_or("").trim();
    let password = body.password.as_deref().unwrap_or("");
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("username and password required".into()));
    }

    let admin: Option<Admin> = sqlx::query_as("SELECT * FROM admins WHERE username = $1")
        .bind(username)
        .fetch_optional(&state.pool)
        .await?;
    // One generic message for unknown user and wrong password.
    let admin = admin.ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;
    if !verify_password(password, &admin.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }

    sqlx::query("UPDATE admins SET last_login = NOW() WHERE id = $1")
        .bind(admin.id)
        .execute(&state.pool)
        .await?;

    let token = issue_token(
        &state.config.jwt_secret,
        admin.id,
        &admin.username,
        state.config.token_ttl_secs,
    )?;
    tracing::debug!(username = %admin.username, "admin logged in");
    Ok(Json(LoginResponse {
        token,
        user: admin.into(),
    }))
}

/// POST /api/auth/verify
pub async fn verify(AdminClaims(claims): AdminClaims) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: claims,
    })
}

/// POST /api/auth/change-password
pub async fn change_password(
    AdminClaims(claims): AdminClaims,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<crate::response::MessageBody>, AppError> {
    let current = body.current_password.as_deref().unwrap_or("");
    let new = body.new_password.as_deref().unwrap_or("");
    if current.is_empty() || new.is_empty() {
        return Err(AppError::BadRequest(
            "current and new password required".into(),
        ));
    }
    if new.len() < 8 {
        return Err(AppError::BadRequest(
            "new password must be at least 8 characters".into(),
        ));
    }

    let stored: Option<(String,)> =
        sqlx::query_as("SELECT password_hash FROM admins WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.pool)
            .await?;
    let (password_hash,) =
        stored.ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;
    if !verify_password(current, &password_hash) {
        return Err(AppError::Unauthorized("current password is incorrect".into()));
    }

    let new_hash = hash_password(new)?;
    sqlx::query("UPDATE admins SET password_hash = $1 WHERE id = $2")
        .bind(&new_hash)
        .bind(claims.sub)
        .execute(&state.pool)
        .await?;
    Ok(message("password changed"))
}
