// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{AccountType, Principal};
use crate::services::CredentialError;
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// API routes (require authentication).
/// The principal check is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/protected/get/user-info", get(get_user_info))
        .route("/api/protected/update-username", post(update_username))
        .route("/api/protected/update-password", post(update_password))
        .route("/api/protected/get/login-activity", get(get_login_activity))
        .route(
            "/api/protected/get/user/login-activity",
            get(get_user_login_activity),
        )
}

fn principal_user_id(principal: &Principal) -> Result<Uuid> {
    Uuid::parse_str(&principal.user_id)
        .map_err(|_| AppError::NotFound(format!("User {} not found", principal.user_id)))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserInfoResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub account_type: AccountType,
    pub login_streak: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub last_login_date: Option<chrono::NaiveDate>,
    pub created_at: String,
}

async fn get_user_info(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserInfoResponse>> {
    let user_id = principal_user_id(&principal)?;
    let user = state
        .db
        .load_user_record(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(UserInfoResponse {
        user_id: user.id.to_string(),
        username: user.username,
        email: user.email,
        account_type: user.account_type,
        login_streak: user.login_streak,
        last_login_date: user.last_login_date,
        created_at: user.created_at,
    }))
}

// ─── Username Change ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUsernameRequest {
    pub new_username: Option<String>,
}

async fn update_username(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateUsernameRequest>,
) -> Result<Json<MessageResponse>> {
    let Some(new_username) = request.new_username else {
        return Err(AppError::BadRequest(
            "No new username provided. Please provide a valid username.".to_string(),
        ));
    };
    let new_username = new_username.trim();
    if new_username.is_empty() {
        return Err(AppError::BadRequest(
            "New username can't be empty or contain only whitespace characters. Please provide a valid username."
                .to_string(),
        ));
    }
    if new_username.chars().count() > 100 {
        return Err(AppError::BadRequest(
            "Username must be 1-100 characters".to_string(),
        ));
    }

    let user_id = principal_user_id(&principal)?;
    state
        .db
        .update_username(user_id, new_username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    tracing::info!(user_id = %user_id, "Username updated");

    Ok(Json(MessageResponse {
        message: "Successfully updated username.".to_string(),
    }))
}

// ─── Password Change ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let old_password = request.old_password.trim();
    let new_password = request.new_password.trim();
    if old_password.is_empty() || new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Provided passwords can't be empty or contain only whitespace characters.".to_string(),
        ));
    }
    if !(8..=128).contains(&new_password.chars().count()) {
        return Err(AppError::BadRequest(
            "Password must be 8-128 characters".to_string(),
        ));
    }

    let user_id = principal_user_id(&principal)?;
    state
        .credentials
        .change_password(user_id, old_password, new_password)
        .await
        .map_err(|e| match e {
            CredentialError::InvalidCredentials => {
                AppError::BadRequest("Old password is incorrect.".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(MessageResponse {
        message: "Successfully updated password.".to_string(),
    }))
}

// ─── Login Activity ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginActivityQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginActivityResponse {
    pub year: i32,
    pub month: Option<u32>,
    /// One marker per day slot: 1 logged in, 0 not, -1 no such day
    pub activity: Vec<i8>,
    pub login_streak: u32,
}

/// Query for the account-scoped path, where the year is mandatory.
#[derive(Debug, Deserialize)]
pub struct UserLoginActivityQuery {
    pub year: i32,
    pub month: Option<u32>,
}

async fn get_login_activity(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<LoginActivityQuery>,
) -> Result<Json<LoginActivityResponse>> {
    let year = query.year.unwrap_or_else(|| today_utc().year());
    login_activity(&state, &principal, year, query.month).await
}

async fn get_user_login_activity(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<UserLoginActivityQuery>,
) -> Result<Json<LoginActivityResponse>> {
    login_activity(&state, &principal, query.year, query.month).await
}

async fn login_activity(
    state: &AppState,
    principal: &Principal,
    year: i32,
    month: Option<u32>,
) -> Result<Json<LoginActivityResponse>> {
    let user_id = principal_user_id(principal)?;
    let ledger = state.activity_recorder.ledger();

    let activity = match month {
        Some(month) => ledger.month_slice(user_id, year, month).await?,
        None => ledger.year_slice(user_id, year).await?,
    };

    let login_streak = state
        .db
        .load_user_record(user_id)
        .await?
        .map(|user| user.login_streak)
        .unwrap_or_default();

    Ok(Json(LoginActivityResponse {
        year,
        month,
        activity,
        login_streak,
    }))
}
