#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

async fn pro_token(state: &momentum_api::state::AppState, email: &str) -> String {
    let user = common::seed_user(&state.db, email).await;
    common::seed_active_subscription(&state.db, user.id).await;
    common::login(state, &user).await.access_token
}

async fn create_session(
    app: &axum::Router,
    token: &str,
    duration: i32,
    session_type: &str,
) -> String {
    let (status, body) = common::post_json(
        app,
        "/api/v1/pomodoro",
        Some(token),
        &json!({ "duration": duration, "sessionType": session_type }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    common::json(&body)["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn session_lifecycle_start_then_complete() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "pomo1@example.com").await;
    let id = create_session(&app, &token, 25, "work").await;

    let (_, body) = common::get(&app, &format!("/api/v1/pomodoro/{id}"), Some(&token)).await;
    let json = common::json(&body);
    assert_eq!(json["data"]["completed"], false);
    assert!(json["data"]["startedAt"].is_null());

    let (status, body) =
        common::patch(&app, &format!("/api/v1/pomodoro/{id}/start"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(common::json(&body)["data"]["startedAt"].is_string());

    let (status, body) = common::patch(
        &app,
        &format!("/api/v1/pomodoro/{id}/complete"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = common::json(&body);
    assert_eq!(json["data"]["completed"], true);
    assert!(json["data"]["completedAt"].is_string());
}

#[tokio::test]
async fn invalid_sessions_are_rejected() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "pomo2@example.com").await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/pomodoro",
        Some(&token),
        &json!({ "duration": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json(
        &app,
        "/api/v1/pomodoro",
        Some(&token),
        &json!({ "duration": 25, "sessionType": "nap" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_aggregate_completed_sessions_by_type() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "pomo3@example.com").await;

    for duration in [25, 25] {
        let id = create_session(&app, &token, duration, "work").await;
        common::patch(&app, &format!("/api/v1/pomodoro/{id}/complete"), Some(&token)).await;
    }
    let id = create_session(&app, &token, 5, "short_break").await;
    common::patch(&app, &format!("/api/v1/pomodoro/{id}/complete"), Some(&token)).await;
    // Never completed, so it stays out of the stats
    create_session(&app, &token, 50, "work").await;

    let (status, body) = common::get(&app, "/api/v1/pomodoro/stats", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let json = common::json(&body);
    assert_eq!(json["data"]["totalSessions"], 3);
    assert_eq!(json["data"]["byType"]["work"]["count"], 2);
    assert_eq!(json["data"]["byType"]["work"]["totalMinutes"], 50);
    assert_eq!(json["data"]["byType"]["short_break"]["totalMinutes"], 5);
}

#[tokio::test]
async fn list_filters_by_completion() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "pomo4@example.com").await;

    let id = create_session(&app, &token, 25, "work").await;
    common::patch(&app, &format!("/api/v1/pomodoro/{id}/complete"), Some(&token)).await;
    create_session(&app, &token, 25, "work").await;

    let (_, body) = common::get(&app, "/api/v1/pomodoro?completed=false", Some(&token)).await;
    assert_eq!(common::json(&body)["data"].as_array().unwrap().len(), 1);
}
