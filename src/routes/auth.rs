// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public session routes: registration, login, logout and explicit renewal.

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::middleware::cookies::{clear_refresh_cookie, refresh_cookie, refresh_token_from_jar};
use crate::models::{AccountType, User};
use crate::services::token::{TokenError, TokenType};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

/// Public session routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/public/register", post(register))
        .route("/api/public/login", post(login))
        .route("/api/public/logout", post(logout))
        .route(
            "/api/public/refresh-access-token",
            get(refresh_access_token),
        )
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,
    #[validate(
        email(message = "E-mail address is not valid"),
        length(min = 5, max = 100, message = "E-mail must be 5-100 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    pub account_type: String,
}

impl RegisterRequest {
    /// Strip surrounding whitespace before validation.
    fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
            account_type: self.account_type.trim().to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub user_id: String,
    pub message: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let request = request.trimmed();
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let account_type: AccountType = request
        .account_type
        .parse()
        .map_err(|e: crate::models::user::UnknownAccountType| {
            AppError::BadRequest(e.to_string())
        })?;

    if state.db.find_by_username(&request.username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: request.username,
        email: request.email,
        password_hash: state.credentials.hash_password(&request.password)?,
        account_type,
        login_streak: 0,
        last_login_date: None,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    state.db.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, account_type = %account_type, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id.to_string(),
            message: "User registered successfully.".to_string(),
        }),
    ))
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub access_token: String,
    pub account_type: AccountType,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let principal = match state
        .credentials
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Err(e.into());
        }
    };

    let access_token = state.token_codec.issue(
        &principal.user_email,
        &principal.user_id,
        principal.account_type,
        TokenType::Access,
    )?;
    let refresh_token = state.token_codec.issue(
        &principal.user_email,
        &principal.user_id,
        principal.account_type,
        TokenType::Refresh,
    )?;

    tracing::info!(user_id = %principal.user_id, "User logged in");

    let jar = jar.add(refresh_cookie(&state.config, &refresh_token));
    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            account_type: principal.account_type,
        }),
    ))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.add(clear_refresh_cookie(&state.config)), StatusCode::OK)
}

// ─── Explicit Renewal ────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Mint a new access token from the refresh cookie alone.
async fn refresh_access_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<AccessTokenResponse>> {
    let token = refresh_token_from_jar(&jar)
        .ok_or_else(|| AppError::NotFound("No refresh token provided.".to_string()))?;

    let claims = state
        .token_codec
        .verify_as(&token, TokenType::Refresh)
        .map_err(|e| match e {
            TokenError::Expired => AppError::BadRequest("Refresh token expired.".to_string()),
            _ => AppError::BadRequest("Invalid refresh token provided.".to_string()),
        })?;

    let access_token = state.token_codec.issue(
        &claims.sub,
        &claims.user_id,
        claims.account_type,
        TokenType::Access,
    )?;

    Ok(Json(AccessTokenResponse { access_token }))
}
