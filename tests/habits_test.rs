#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

async fn pro_token(state: &momentum_api::state::AppState, email: &str) -> String {
    let user = common::seed_user(&state.db, email).await;
    common::seed_active_subscription(&state.db, user.id).await;
    common::login(state, &user).await.access_token
}

async fn create_habit(app: &axum::Router, token: &str, name: &str) -> String {
    let (status, body) = common::post_json(
        app,
        "/api/v1/habits",
        Some(token),
        &json!({ "name": name }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "habit create failed: {body}");
    common::json(&body)["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn checkin_defaults_to_today_and_toggles() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "habit1@example.com").await;
    let habit_id = create_habit(&app, &token, "Read").await;
    let uri = format!("/api/v1/habits/{habit_id}/checkin");

    let (status, body) = common::post_json(&app, &uri, Some(&token), &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let json = common::json(&body);
    assert_eq!(json["data"]["completed"], true);
    assert_eq!(
        json["data"]["date"],
        Utc::now().date_naive().to_string()
    );

    // A second bare checkin on the same day toggles instead of duplicating
    let (_, body) = common::post_json(&app, &uri, Some(&token), &json!({})).await;
    assert_eq!(common::json(&body)["data"]["completed"], false);

    let entries_uri = format!("/api/v1/habits/{habit_id}/entries");
    let (_, body) = common::get(&app, &entries_uri, Some(&token)).await;
    assert_eq!(common::json(&body)["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkin_accepts_explicit_date_and_state() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "habit2@example.com").await;
    let habit_id = create_habit(&app, &token, "Stretch").await;
    let uri = format!("/api/v1/habits/{habit_id}/checkin");

    let (_, body) = common::post_json(
        &app,
        &uri,
        Some(&token),
        &json!({ "date": "2026-08-01", "completed": false, "notes": "skipped" }),
    )
    .await;
    let json = common::json(&body);
    assert_eq!(json["data"]["completed"], false);
    assert_eq!(json["data"]["notes"], "skipped");

    // Explicit completed overrides the toggle behavior
    let (_, body) = common::post_json(
        &app,
        &uri,
        Some(&token),
        &json!({ "date": "2026-08-01", "completed": false }),
    )
    .await;
    assert_eq!(common::json(&body)["data"]["completed"], false);
}

#[tokio::test]
async fn streak_counts_consecutive_days_ending_today() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "habit3@example.com").await;
    let habit_id = create_habit(&app, &token, "Run").await;
    let checkin_uri = format!("/api/v1/habits/{habit_id}/checkin");

    let today = Utc::now().date_naive();
    for offset in 0..3 {
        let date = today - Duration::days(offset);
        common::post_json(
            &app,
            &checkin_uri,
            Some(&token),
            &json!({ "date": date.to_string(), "completed": true }),
        )
        .await;
    }
    // A gap: five days ago does not extend the streak
    common::post_json(
        &app,
        &checkin_uri,
        Some(&token),
        &json!({ "date": (today - Duration::days(5)).to_string(), "completed": true }),
    )
    .await;

    let (_, body) = common::get(
        &app,
        &format!("/api/v1/habits/{habit_id}/streak"),
        Some(&token),
    )
    .await;
    assert_eq!(common::json(&body)["data"]["streak"], 3);
}

#[tokio::test]
async fn streak_is_zero_without_a_checkin_today() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "habit4@example.com").await;
    let habit_id = create_habit(&app, &token, "Write").await;

    let yesterday = Utc::now().date_naive() - Duration::days(1);
    common::post_json(
        &app,
        &format!("/api/v1/habits/{habit_id}/checkin"),
        Some(&token),
        &json!({ "date": yesterday.to_string(), "completed": true }),
    )
    .await;

    let (_, body) = common::get(
        &app,
        &format!("/api/v1/habits/{habit_id}/streak"),
        Some(&token),
    )
    .await;
    assert_eq!(common::json(&body)["data"]["streak"], 0);
}

#[tokio::test]
async fn entries_filter_by_date_range() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let token = pro_token(&state, "habit5@example.com").await;
    let habit_id = create_habit(&app, &token, "Journal").await;
    let checkin_uri = format!("/api/v1/habits/{habit_id}/checkin");

    for date in ["2026-08-01", "2026-08-10", "2026-08-20"] {
        common::post_json(
            &app,
            &checkin_uri,
            Some(&token),
            &json!({ "date": date, "completed": true }),
        )
        .await;
    }

    let uri = format!(
        "/api/v1/habits/{habit_id}/entries?startDate=2026-08-05&endDate=2026-08-15"
    );
    let (_, body) = common::get(&app, &uri, Some(&token)).await;
    let listed = common::json(&body);
    let items = listed["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["date"], "2026-08-10");
}

#[tokio::test]
async fn foreign_habit_checkin_is_404() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let owner_token = pro_token(&state, "habitowner@example.com").await;
    let other_token = pro_token(&state, "habitother@example.com").await;
    let habit_id = create_habit(&app, &owner_token, "Private").await;

    let (status, _) = common::post_json(
        &app,
        &format!("/api/v1/habits/{habit_id}/checkin"),
        Some(&other_token),
        &json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
