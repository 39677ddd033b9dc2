//! Admin login, session checks, and password changes.

use axum::extract::{Extension, State};
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::middleware::{admin_auth, AdminContext};
use crate::models::User;
use crate::password::{hash_password, verify_password};

const MIN_PASSWORD_LEN: usize = 8;

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/check", get(check))
        .route("/api/auth/change-password", post(change_password))
        .layer(middleware::from_fn_with_state(state, admin_auth));

    Router::new()
        .route("/api/auth/login", post(login))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let conn = state.db.get()?;

    let Some((user, stored_hash)) = queries::get_user_with_password(&conn, &request.email)? else {
        // Same error for unknown email and bad password
        return Err(AppError::Unauthorized(msg::INVALID_CREDENTIALS.into()));
    };
    if !verify_password(&request.password, &stored_hash) {
        return Err(AppError::Unauthorized(msg::INVALID_CREDENTIALS.into()));
    }

    let token = state.sessions.create(user.id, &user.email, &user.name);
    tracing::info!(user = %user.email, "Admin logged in");

    Ok(Json(LoginResponse { token, user }))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Json<LogoutResponse> {
    state.sessions.remove(&admin.session_token);
    Json(LogoutResponse { success: true })
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub authenticated: bool,
    pub user: User,
}

pub async fn check(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Result<Json<CheckResponse>> {
    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, admin.user_id)?
        .or_not_found("User no longer exists")?;
    Ok(Json(CheckResponse {
        authenticated: true,
        user,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<LogoutResponse>> {
    if request.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(msg::PASSWORD_TOO_SHORT.into()));
    }

    let conn = state.db.get()?;
    let stored_hash = queries::get_password_hash(&conn, admin.user_id)?
        .or_not_found("User no longer exists")?;
    if !verify_password(&request.current_password, &stored_hash) {
        return Err(AppError::BadRequest(msg::CURRENT_PASSWORD_WRONG.into()));
    }

    let new_hash = hash_password(&request.new_password)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    queries::update_password(&conn, admin.user_id, &new_hash)?;
    tracing::info!(user = %admin.email, "Admin password changed");

    Ok(Json(LogoutResponse { success: true }))
}
