//! Integration tests for the account flow.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "alice", "password": "hunter2" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body.get("user_id").and_then(|v| v.as_str()).is_some());
    let token = helpers::token_of(&response);
    assert_eq!(app.state.tokens.validate(&token).unwrap(), "alice");
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let app = helpers::TestApp::new();
    app.register("alice", "hunter2").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "alice", "password": "other" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_register_empty_username_rejected() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "username": "", "password": "pw" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success() {
    let app = helpers::TestApp::new();
    app.register("alice", "hunter2").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "alice", "password": "hunter2" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let token = helpers::token_of(&response);
    assert_eq!(app.state.tokens.validate(&token).unwrap(), "alice");
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = helpers::TestApp::new();
    app.register("alice", "hunter2").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "alice", "password": "wrong" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_nonexistent_user() {
    let app = helpers::TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "nobody", "password": "pw" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_only_that_token() {
    let app = helpers::TestApp::new();
    let first = app.register("alice", "hunter2").await;

    let login = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": "alice", "password": "hunter2" })),
            None,
        )
        .await;
    let second = helpers::token_of(&login);

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&first))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/items", None, Some(&first)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/api/items", None, Some(&second)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/items", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/items", None, Some("not-a-token"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
