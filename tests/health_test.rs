#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn health_reports_connected_database() {
    let state = common::test_state().await;
    let app = common::app(&state);

    let (status, body) = common::get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let json = common::json(&body);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
