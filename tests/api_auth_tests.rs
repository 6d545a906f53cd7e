// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and explicit renewal endpoint tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use coursegate::db::UserStore;
use coursegate::models::AccountType;
use coursegate::services::TokenType;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register_body(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "email": email,
        "password": "  long-enough-password  ",
        "accountType": "instructor",
    })
}

#[tokio::test]
async fn test_register_then_login() {
    let (app, state) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(json_post(
            "/api/public/register",
            register_body("grace", "grace@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = state.db.find_by_username("grace").await.unwrap().unwrap();
    assert_eq!(stored.account_type, AccountType::Instructor);
    assert_eq!(stored.login_streak, 0);
    assert!(stored.last_login_date.is_none());
    assert_ne!(stored.password_hash, "long-enough-password");

    // Password was trimmed before hashing
    let response = app
        .oneshot(json_post(
            "/api/public/login",
            json!({ "email": "grace@example.com", "password": "long-enough-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["accountType"], "Instructor");
    let claims = state
        .token_codec
        .verify_as(body["accessToken"].as_str().unwrap(), TokenType::Access)
        .unwrap();
    assert_eq!(claims.user_id, stored.id.to_string());
    assert_eq!(claims.sub, "grace@example.com");
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let (app, _) = common::create_test_app();

    let first = app
        .clone()
        .oneshot(json_post(
            "/api/public/register",
            register_body("dup", "dup@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let same_name = app
        .clone()
        .oneshot(json_post(
            "/api/public/register",
            register_body("DUP", "other@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(same_name.status(), StatusCode::CONFLICT);

    let same_email = app
        .oneshot(json_post(
            "/api/public/register",
            register_body("someone-else", "Dup@Example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(same_email.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _) = common::create_test_app();

    let cases = [
        json!({ "username": "a", "email": "not-an-email", "password": "long-enough", "accountType": "Learner" }),
        json!({ "username": "a", "email": "a@example.com", "password": "   short   ", "accountType": "Learner" }),
        json!({ "username": "   ", "email": "a@example.com", "password": "long-enough", "accountType": "Learner" }),
        json!({ "username": "a", "email": "a@example.com", "password": "long-enough", "accountType": "Admin" }),
    ];

    for case in cases {
        let response = app
            .clone()
            .oneshot(json_post("/api/public/register", case.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case: {case}");
    }
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "ada@example.com", Some(common::TEST_PASSWORD)).await;

    let wrong_password = app
        .clone()
        .oneshot(json_post(
            "/api/public/login",
            json!({ "email": "ada@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .oneshot(json_post(
            "/api/public/login",
            json!({ "email": "nobody@example.com", "password": common::TEST_PASSWORD }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert!(common::set_cookie_headers(&wrong_password).is_empty());

    let wrong_password = common::body_json(wrong_password).await;
    let unknown_email = common::body_json(unknown_email).await;
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_refresh_endpoint_without_cookie_is_not_found() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/public/refresh-access-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refresh_endpoint_rejects_expired_and_invalid_tokens() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "stale@example.com", None).await;
    let issued_at = chrono::Utc::now().timestamp() - state.config.refresh_token_ttl_secs - 60;
    let expired = state
        .token_codec
        .issue_at(
            &user.email,
            &user.id.to_string(),
            user.account_type,
            TokenType::Refresh,
            issued_at,
        )
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/public/refresh-access-token")
                .header(header::COOKIE, format!("REFRESH_TOKEN={expired}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "Refresh token expired.");

    let access = common::issue_token(&state, &user, TokenType::Access);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/public/refresh-access-token")
                .header(header::COOKIE, format!("REFRESH_TOKEN={access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["details"], "Invalid refresh token provided.");
}

#[tokio::test]
async fn test_update_password() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "pw@example.com", Some(common::TEST_PASSWORD)).await;
    let access = common::issue_token(&state, &user, TokenType::Access);

    let update = |old: &str, new: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/protected/update-password")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {access}"))
            .body(Body::from(
                json!({ "oldPassword": old, "newPassword": new }).to_string(),
            ))
            .unwrap()
    };

    let wrong = app
        .clone()
        .oneshot(update("not-my-password", "brand-new-password"))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);

    let ok = app
        .clone()
        .oneshot(update(common::TEST_PASSWORD, "brand-new-password"))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let login = app
        .oneshot(json_post(
            "/api/public/login",
            json!({ "email": "pw@example.com", "password": "brand-new-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_username() {
    let (app, state) = common::create_test_app();
    let user = common::seed_user(&state, "rename@example.com", None).await;
    common::seed_user(&state, "taken@example.com", None).await;
    let access = common::issue_token(&state, &user, TokenType::Access);

    let update = |body: Value| {
        Request::builder()
            .method("POST")
            .uri("/api/protected/update-username")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {access}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let missing = app.clone().oneshot(update(json!({}))).await.unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let blank = app
        .clone()
        .oneshot(update(json!({ "newUsername": "   " })))
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let taken = app
        .clone()
        .oneshot(update(json!({ "newUsername": "TAKEN" })))
        .await
        .unwrap();
    assert_eq!(taken.status(), StatusCode::CONFLICT);

    let ok = app
        .clone()
        .oneshot(update(json!({ "newUsername": "  renamed  " })))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = common::body_json(ok).await;
    assert_eq!(body["message"], "Successfully updated username.");

    let stored = state.db.load_user_record(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "renamed");

    // The old name is free for registration again
    let response = app
        .oneshot(json_post(
            "/api/public/register",
            register_body("rename", "newcomer@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}
