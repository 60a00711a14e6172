// SPDX-License-Identifier: MIT

//! Admin route access control tests.
//!
//! The admin claim rides in the JWT; these tests check the gate without
//! touching the identity provider (the offline mock fails with 502 after
//! the gate passes, which is the signal that authorization succeeded).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn get_admin_users(app: axum::Router, token: &str) -> StatusCode {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri("/api/admin/users")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_non_admin_denied() {
    let (app, state) = common::create_test_app();
    let token = common::test_token(&state);

    assert_eq!(get_admin_users(app, &token).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_passes_gate() {
    let (app, state) = common::create_test_app();
    let token = common::admin_token(&state);

    // Gate passes; the offline identity mock then fails the listing.
    assert_eq!(get_admin_users(app, &token).await, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_unauthenticated_denied_before_gate() {
    let (app, _) = common::create_test_app();

    let status = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/admin/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status();

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
