//! Integration tests for WebSocket sessions against a live server.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{recv_close, recv_json, send_json, ws_authorized, ws_connect};

#[tokio::test]
async fn test_chat_echoes_to_every_connection_of_sender() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let addr = app.spawn().await;

    let mut first = ws_authorized(&app, addr, &token).await;
    let mut second = ws_authorized(&app, addr, &token).await;

    send_json(
        &mut first,
        json!({ "type": "chat", "payload": "hi", "sender": "mallory" }),
    )
    .await;

    for client in [&mut first, &mut second] {
        let message = recv_json(client).await;
        assert_eq!(message["type"], "chat");
        assert_eq!(message["payload"], "hi");
        assert_eq!(message["sender"], "alice");
        assert!(message["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_logout_message_closes_connection() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let addr = app.spawn().await;

    let mut client = ws_authorized(&app, addr, &token).await;
    send_json(&mut client, json!({ "type": "logout" })).await;

    let (code, reason) = recv_close(&mut client).await;
    assert_eq!(code, 1000);
    assert_eq!(reason, "User logged out");
    app.wait_for_connections(0).await;
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let app = helpers::TestApp::new();
    let addr = app.spawn().await;

    let mut client = ws_connect(addr).await;
    send_json(
        &mut client,
        json!({ "type": "authorization", "payload": "garbage" }),
    )
    .await;

    let notice = recv_json(&mut client).await;
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["payload"], "Invalid token");
    assert_eq!(notice["sender"], "server");

    let (code, _) = recv_close(&mut client).await;
    assert_eq!(code, 1008);
    assert_eq!(app.state.realtime.registry.connection_count().await, 0);
}

#[tokio::test]
async fn test_first_message_must_be_authorization() {
    let app = helpers::TestApp::new();
    let addr = app.spawn().await;

    let mut client = ws_connect(addr).await;
    send_json(&mut client, json!({ "type": "chat", "payload": "hi" })).await;

    let notice = recv_json(&mut client).await;
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["payload"], "Invalid message type");
}

#[tokio::test]
async fn test_revoked_token_cannot_open_session() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let addr = app.spawn().await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let mut client = ws_connect(addr).await;
    send_json(
        &mut client,
        json!({ "type": "authorization", "payload": token }),
    )
    .await;
    let notice = recv_json(&mut client).await;
    assert_eq!(notice["payload"], "Invalid token");
}

#[tokio::test]
async fn test_http_logout_closes_all_sessions_of_identity() {
    let app = helpers::TestApp::new();
    let alice = app.register("alice", "pw").await;
    let bob = app.register("bob", "pw").await;
    let addr = app.spawn().await;

    let mut first = ws_authorized(&app, addr, &alice).await;
    let mut second = ws_authorized(&app, addr, &alice).await;
    let _bob_client = ws_authorized(&app, addr, &bob).await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&alice))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["connections_closed"], 2);

    for client in [&mut first, &mut second] {
        let (code, reason) = recv_close(client).await;
        assert_eq!(code, 1000);
        assert_eq!(reason, "User logged out");
    }
    app.wait_for_connections(1).await;
    assert!(
        app.state
            .realtime
            .registry
            .connections_of("alice")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_item_events_reach_owner() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let addr = app.spawn().await;
    let mut client = ws_authorized(&app, addr, &token).await;

    let created = app
        .request(
            "POST",
            "/api/items",
            Some(json!({ "title": "Zelda" })),
            Some(&token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["_id"].as_str().unwrap().to_string();

    let event = recv_json(&mut client).await;
    assert_eq!(event["type"], "item_created");
    assert_eq!(event["sender"], "server");
    assert_eq!(event["payload"]["title"], "Zelda");
    assert_eq!(event["payload"]["_id"], id.as_str());

    let deleted = app
        .request("DELETE", &format!("/api/items/{id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let event = recv_json(&mut client).await;
    assert_eq!(event["type"], "item_deleted");
    assert_eq!(event["payload"], id.as_str());
}

#[tokio::test]
async fn test_health_reports_connections() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let addr = app.spawn().await;
    let _client = ws_authorized(&app, addr, &token).await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["store"], "memory");
    assert_eq!(response.body["ws_connections"], 1);
    assert_eq!(response.body["online_users"], 1);
}
