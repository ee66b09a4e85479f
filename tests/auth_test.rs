#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

// ──────────────────────────────────────────────────────────────────────────────
// Refresh rotation
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_rotates_tokens() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "rotate@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/refresh",
        None,
        &json!({ "refreshToken": pair.refresh_token }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "refresh failed: {body}");
    let json = common::json(&body);
    assert_eq!(json["success"], true);
    let new_refresh = json["data"]["refreshToken"].as_str().unwrap();
    assert!(json["data"]["accessToken"].is_string());
    assert_ne!(new_refresh, pair.refresh_token);
}

#[tokio::test]
async fn used_refresh_token_is_rejected() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "replay@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/refresh",
        None,
        &json!({ "refreshToken": pair.refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The consumed token's row is gone, so a replay fails verification
    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/refresh",
        None,
        &json!({ "refreshToken": pair.refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let json = common::json(&body);
    assert_eq!(json["success"], false);
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("refresh token")
    );
}

#[tokio::test]
async fn refresh_rejects_garbage_and_access_tokens() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "garbage@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/refresh",
        None,
        &json!({ "refreshToken": "not-a-jwt" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An access token is signed with the other secret and typed "access"
    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/refresh",
        None,
        &json!({ "refreshToken": pair.access_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ──────────────────────────────────────────────────────────────────────────────
// Logout
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "logout@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/auth/logout",
        None,
        &json!({ "refreshToken": pair.refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::json(&body)["message"], "Logged out successfully.");

    let (status, _) = common::post_json(
        &app,
        "/api/v1/auth/refresh",
        None,
        &json!({ "refreshToken": pair.refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let state = common::test_state().await;
    let app = common::app(&state);

    for _ in 0..2 {
        let (status, _) = common::post_json(
            &app,
            "/api/v1/auth/logout",
            None,
            &json!({ "refreshToken": "already-gone" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Access token guard
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn me_requires_bearer_token() {
    let state = common::test_state().await;
    let app = common::app(&state);

    let (status, _) = common::get(&app, "/api/v1/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::get(&app, "/api/v1/users/me", Some("bogus")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_profile_for_valid_token() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "me@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, body) =
        common::get(&app, "/api/v1/users/me", Some(&pair.access_token)).await;
    assert_eq!(status, StatusCode::OK, "me failed: {body}");
    let json = common::json(&body);
    assert_eq!(json["data"]["email"], "me@example.com");
}

#[tokio::test]
async fn refresh_token_cannot_authenticate_requests() {
    let state = common::test_state().await;
    let app = common::app(&state);
    let user = common::seed_user(&state.db, "wrongtype@example.com").await;
    let pair = common::login(&state, &user).await;

    let (status, _) =
        common::get(&app, "/api/v1/users/me", Some(&pair.refresh_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_enveloped_404() {
    let state = common::test_state().await;
    let app = common::app(&state);

    let (status, body) = common::get(&app, "/api/v1/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(common::json(&body)["success"], false);
}
