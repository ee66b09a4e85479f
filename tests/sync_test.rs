#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

async fn pro_token(state: &momentum_api::state::AppState, email: &str) -> String {
    let user = common::seed_user(&state.db, email).await;
    common::seed_active_subscription(&state.db, user.id).await;
    common::login(state, &user).await.access_token
}

#[tokio::test]
async fn first_push_inserts_with_version_one() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "sync1@example.com").await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "settings", "data": { "theme": "dark" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "push failed: {body}");
    let json = common::json(&body);
    assert_eq!(json["data"]["version"], 1);
    assert_eq!(json["data"]["data"]["theme"], "dark");
}

#[tokio::test]
async fn newer_version_wins_stale_version_bumps() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "sync2@example.com").await;

    common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "settings", "data": { "n": 1 }, "version": 3 }),
    )
    .await;

    // Client ahead of the server: its version is taken as-is
    let (_, body) = common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "settings", "data": { "n": 2 }, "version": 7 }),
    )
    .await;
    assert_eq!(common::json(&body)["data"]["version"], 7);

    // Stale client: data still lands but the version moves past the stored one
    let (_, body) = common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "settings", "data": { "n": 3 }, "version": 2 }),
    )
    .await;
    let json = common::json(&body);
    assert_eq!(json["data"]["version"], 8);
    assert_eq!(json["data"]["data"]["n"], 3);
}

async fn create_workspace(app: &axum::Router, token: &str, name: &str) -> String {
    let (status, body) = common::post_json(
        app,
        "/api/v1/workspaces",
        Some(token),
        &serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "workspace create failed: {body}");
    common::json(&body)["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn workspace_scopes_are_independent() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "sync3@example.com").await;
    let workspace_id = create_workspace(&app, &token, "Side project").await;

    common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "layout", "data": { "cols": 2 } }),
    )
    .await;
    common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "layout", "data": { "cols": 4 }, "workspaceId": workspace_id }),
    )
    .await;

    let (_, body) = common::get(&app, "/api/v1/sync/layout", Some(&token)).await;
    assert_eq!(common::json(&body)["data"]["data"]["cols"], 2);

    let uri = format!("/api/v1/sync/layout?workspaceId={workspace_id}");
    let (_, body) = common::get(&app, &uri, Some(&token)).await;
    assert_eq!(common::json(&body)["data"]["data"]["cols"], 4);

    let (_, body) = common::get(&app, "/api/v1/sync", Some(&token)).await;
    assert_eq!(common::json(&body)["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn push_rejects_unknown_or_foreign_workspace() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "sync5@example.com").await;

    // Workspace that does not exist
    let (status, body) = common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({
            "dataType": "layout",
            "data": {},
            "workspaceId": uuid::Uuid::new_v4(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        common::json(&body)["error"]["message"],
        "Workspace not found."
    );

    // Workspace that belongs to someone else
    let other_token = pro_token(&state, "sync6@example.com").await;
    let other_workspace = create_workspace(&app, &other_token, "Theirs").await;
    let (status, _) = common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "layout", "data": {}, "workspaceId": other_workspace }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_only_the_named_scope() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "sync4@example.com").await;

    common::post_json(
        &app,
        "/api/v1/sync",
        Some(&token),
        &json!({ "dataType": "shortcuts", "data": [] }),
    )
    .await;

    let (status, _) = common::delete(&app, "/api/v1/sync/shortcuts", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::get(&app, "/api/v1/sync/shortcuts", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::delete(&app, "/api/v1/sync/shortcuts", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sync_requires_pro() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "syncfree@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/sync",
        Some(&pair.access_token),
        &json!({ "dataType": "settings", "data": {} }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
