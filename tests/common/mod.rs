// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{http::header, response::Response};
use coursegate::config::Config;
use coursegate::db::{MemoryDb, UserStore};
use coursegate::models::{AccountType, User};
use coursegate::routes::create_router;
use coursegate::services::TokenType;
use coursegate::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Password used for seeded users that need to log in.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Create a test app over an empty in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app with a custom configuration.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, MemoryDb::new()));
    (create_router(state.clone()), state)
}

/// Insert a user. With `password` the stored hash is real, otherwise it is a
/// placeholder that never verifies.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, email: &str, password: Option<&str>) -> User {
    let password_hash = match password {
        Some(password) => state.credentials.hash_password(password).unwrap(),
        None => "not-a-phc-string".to_string(),
    };
    let user = User {
        id: Uuid::new_v4(),
        username: email.split('@').next().unwrap().to_string(),
        email: email.to_string(),
        password_hash,
        account_type: AccountType::Learner,
        login_streak: 0,
        last_login_date: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };
    state.db.insert_user(&user).await.unwrap();
    user
}

/// Issue a token of `token_type` for `user`, valid from now.
#[allow(dead_code)]
pub fn issue_token(state: &AppState, user: &User, token_type: TokenType) -> String {
    state
        .token_codec
        .issue(
            &user.email,
            &user.id.to_string(),
            user.account_type,
            token_type,
        )
        .unwrap()
}

/// Issue an access token that expired an hour ago.
#[allow(dead_code)]
pub fn expired_access_token(state: &AppState, user: &User) -> String {
    let issued_at = chrono::Utc::now().timestamp()
        - state.config.access_token_ttl_secs
        - 3600;
    state
        .token_codec
        .issue_at(
            &user.email,
            &user.id.to_string(),
            user.account_type,
            TokenType::Access,
            issued_at,
        )
        .unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
