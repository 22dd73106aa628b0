//! Integration tests for the per-owner catalog.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

async fn create(app: &helpers::TestApp, token: &str, title: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/api/items",
        Some(json!({ "title": title, "platform": "switch", "daily_rate": 3 })),
        Some(token),
    )
    .await
}

#[tokio::test]
async fn test_create_and_get_item() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;

    let created = create(&app, &token, "Zelda").await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["title"], "Zelda");
    assert_eq!(created.body["owner"], "alice");
    assert_eq!(created.body["version"], 1);

    let id = created.body["_id"].as_str().unwrap().to_string();
    let fetched = app
        .request("GET", &format!("/api/items/{id}"), None, Some(&token))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created.body);
}

#[tokio::test]
async fn test_duplicate_title_conflicts() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;

    assert_eq!(create(&app, &token, "Zelda").await.status, StatusCode::CREATED);
    assert_eq!(create(&app, &token, "Zelda").await.status, StatusCode::CONFLICT);

    let listed = app.request("GET", "/api/items", None, Some(&token)).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_without_title_rejected() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;

    let response = app
        .request("POST", "/api/items", Some(json!({ "platform": "ps5" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_items_are_scoped_to_owner() {
    let app = helpers::TestApp::new();
    let alice = app.register("alice", "pw").await;
    let bob = app.register("bob", "pw").await;

    let created = create(&app, &alice, "Zelda").await;
    let id = created.body["_id"].as_str().unwrap().to_string();

    let listed = app.request("GET", "/api/items", None, Some(&bob)).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert!(listed.body.as_array().unwrap().is_empty());

    let fetched = app
        .request("GET", &format!("/api/items/{id}"), None, Some(&bob))
        .await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);

    let deleted = app
        .request("DELETE", &format!("/api/items/{id}"), None, Some(&bob))
        .await;
    assert_eq!(deleted.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_by_title_and_paginates() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    for title in ["Zelda", "Mario Kart", "Mario Party", "Metroid"] {
        create(&app, &token, title).await;
    }

    let marios = app
        .request("GET", "/api/items?title=mario%25", None, Some(&token))
        .await;
    let titles: Vec<&str> = marios
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Mario Kart", "Mario Party"]);

    let page = app
        .request("GET", "/api/items?skip=1&limit=2", None, Some(&token))
        .await;
    let titles: Vec<&str> = page
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Mario Kart", "Mario Party"]);
}

#[tokio::test]
async fn test_update_bumps_version() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let created = create(&app, &token, "Zelda").await;
    let id = created.body["_id"].as_str().unwrap().to_string();

    let updated = app
        .request(
            "PUT",
            &format!("/api/items/{id}"),
            Some(json!({ "title": "Zelda", "platform": "switch", "daily_rate": 4 })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["version"], 2);
    assert_eq!(updated.body["daily_rate"], 4);
    assert_eq!(updated.body["owner"], "alice");

    // Same body again changes nothing.
    let noop = app
        .request(
            "PUT",
            &format!("/api/items/{id}"),
            Some(json!({ "title": "Zelda", "platform": "switch", "daily_rate": 4 })),
            Some(&token),
        )
        .await;
    assert_eq!(noop.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_may_take_an_existing_title() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    create(&app, &token, "Zelda").await;
    let metroid = create(&app, &token, "Metroid").await;
    let id = metroid.body["_id"].as_str().unwrap().to_string();

    // Titles are only checked for uniqueness when an item is created.
    let renamed = app
        .request(
            "PUT",
            &format!("/api/items/{id}"),
            Some(json!({ "title": "Zelda" })),
            Some(&token),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["title"], "Zelda");
    assert_eq!(renamed.body["version"], 2);

    assert_eq!(create(&app, &token, "Zelda").await.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_title_filter_with_trailing_backslash() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    create(&app, &token, "abc\\").await;
    create(&app, &token, "abcd").await;

    let found = app
        .request("GET", "/api/items?title=abc%5C", None, Some(&token))
        .await;
    assert_eq!(found.status, StatusCode::OK);
    let items = found.body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "abc\\");
}

#[tokio::test]
async fn test_delete_item() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;
    let created = create(&app, &token, "Zelda").await;
    let id = created.body["_id"].as_str().unwrap().to_string();

    let deleted = app
        .request("DELETE", &format!("/api/items/{id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["id"], id.as_str());

    let again = app
        .request("DELETE", &format!("/api/items/{id}"), None, Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);

    let fetched = app
        .request("GET", &format!("/api/items/{id}"), None, Some(&token))
        .await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let app = helpers::TestApp::new();
    let token = app.register("alice", "pw").await;

    let response = app
        .request("GET", "/api/items/not-a-uuid", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
