// SPDX-License-Identifier: MIT

//! Request validation tests.
//!
//! Validation runs before any store access, so these hold even with the
//! offline mock database: a malformed payload must come back 400, never
//! reach the store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

async fn post_json(
    app: axum::Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, _) = common::create_test_app();
    let status = post_json(
        app,
        "/auth/register",
        None,
        json!({
            "email": "not-an-email",
            "password": "secret123",
            "display_name": "Tester"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = common::create_test_app();
    let status = post_json(
        app,
        "/auth/register",
        None,
        json!({
            "email": "tester@example.com",
            "password": "short",
            "display_name": "Tester"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_board_rejects_empty_name() {
    let (app, state) = common::create_test_app();
    let token = common::test_token(&state);

    let status = post_json(
        app,
        "/api/boards",
        Some(&token),
        json!({ "name": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_task_rejects_empty_title() {
    let (app, state) = common::create_test_app();
    let token = common::test_token(&state);

    let status = post_json(
        app,
        "/api/boards/b1/tasks",
        Some(&token),
        json!({ "title": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_task_rejects_unknown_priority() {
    let (app, state) = common::create_test_app();
    let token = common::test_token(&state);

    let status = post_json(
        app,
        "/api/boards/b1/tasks",
        Some(&token),
        json!({ "title": "Valid title", "priority": "urgent" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_comment_rejects_empty_text() {
    let (app, state) = common::create_test_app();
    let token = common::test_token(&state);

    let status = post_json(
        app,
        "/api/boards/b1/tasks/t1/comments",
        Some(&token),
        json!({ "text": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_member_rejects_invalid_email() {
    let (app, state) = common::create_test_app();
    let token = common::test_token(&state);

    let status = post_json(
        app,
        "/api/boards/b1/members",
        Some(&token),
        json!({ "email": "nope" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
