#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn only_one_default_workspace_survives() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "default@example.com").await;
    let pair = common::login(&state, &user).await;
    let token = Some(pair.access_token.as_str());

    let (status, body) = common::post_json(
        &app,
        "/api/v1/workspaces",
        token,
        &json!({ "name": "Work", "isDefault": true }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");

    common::post_json(
        &app,
        "/api/v1/workspaces",
        token,
        &json!({ "name": "Home", "isDefault": true }),
    )
    .await;

    let (_, body) = common::get(&app, "/api/v1/workspaces", token).await;
    let listed = common::json(&body);
    let items = listed["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let defaults: Vec<_> = items.iter().filter(|w| w["isDefault"] == true).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["name"], "Home");
    // Default sorts first
    assert_eq!(items[0]["name"], "Home");
}

#[tokio::test]
async fn promoting_a_workspace_demotes_the_old_default() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "promote@example.com").await;
    let pair = common::login(&state, &user).await;
    let token = Some(pair.access_token.as_str());

    let (_, body) = common::post_json(
        &app,
        "/api/v1/workspaces",
        token,
        &json!({ "name": "Old", "isDefault": true }),
    )
    .await;
    let old_id = common::json(&body)["data"]["id"].as_str().unwrap().to_string();

    let (_, body) =
        common::post_json(&app, "/api/v1/workspaces", token, &json!({ "name": "New" })).await;
    let new_id = common::json(&body)["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = common::put_json(
        &app,
        &format!("/api/v1/workspaces/{new_id}"),
        token,
        &json!({ "isDefault": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::get(&app, &format!("/api/v1/workspaces/{old_id}"), token).await;
    assert_eq!(common::json(&body)["data"]["isDefault"], false);
}

#[tokio::test]
async fn default_workspace_cannot_be_deleted() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "nodelete@example.com").await;
    let pair = common::login(&state, &user).await;
    let token = Some(pair.access_token.as_str());

    let (_, body) = common::post_json(
        &app,
        "/api/v1/workspaces",
        token,
        &json!({ "name": "Main", "isDefault": true }),
    )
    .await;
    let id = common::json(&body)["data"]["id"].as_str().unwrap().to_string();

    let (status, body) =
        common::delete(&app, &format!("/api/v1/workspaces/{id}"), token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        common::json(&body)["error"]["message"],
        "Cannot delete the default workspace."
    );
}

#[tokio::test]
async fn workspaces_are_scoped_per_user() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let owner = common::seed_user(&state.db, "wsowner@example.com").await;
    let other = common::seed_user(&state.db, "wsother@example.com").await;
    let owner_pair = common::login(&state, &owner).await;
    let other_pair = common::login(&state, &other).await;

    let (_, body) = common::post_json(
        &app,
        "/api/v1/workspaces",
        Some(&owner_pair.access_token),
        &json!({ "name": "Secret" }),
    )
    .await;
    let id = common::json(&body)["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = common::put_json(
        &app,
        &format!("/api/v1/workspaces/{id}"),
        Some(&other_pair.access_token),
        &json!({ "name": "Hijacked" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = common::get(
        &app,
        "/api/v1/workspaces",
        Some(&other_pair.access_token),
    )
    .await;
    assert!(common::json(&body)["data"].as_array().unwrap().is_empty());
}
