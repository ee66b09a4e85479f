#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;

const BOUNDARY: &str = "momentum-test-boundary";

fn multipart_file(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn pro_state_with_upload_dir(
    email: &str,
    dir: &tempfile::TempDir,
) -> (momentum_api::state::AppState, String) {
    let mut state = common::test_state().await;
    state.config.upload_dir = dir.path().to_string_lossy().into_owned();
    let user = common::seed_user(&state.db, email).await;
    common::seed_active_subscription(&state.db, user.id).await;
    let token = common::login(&state, &user).await.access_token;
    (state, token)
}

#[tokio::test]
async fn upload_download_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (state, token) = pro_state_with_upload_dir("files@example.com", &dir).await;
    let app = common::app(&state);

    // Kept ASCII so the body helper can round-trip it as a string
    let data = b"png-bytes-stand-in";
    let auth = format!("Bearer {token}");
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    let (status, body) = common::post_raw(
        &app,
        "/api/v1/files/upload",
        &[
            ("Content-Type", content_type.as_str()),
            ("Authorization", auth.as_str()),
        ],
        multipart_file("shot.png", "image/png", data),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "upload failed: {body}");
    let json = common::json(&body);
    assert_eq!(json["data"]["fileName"], "shot.png");
    assert_eq!(json["data"]["mimeType"], "image/png");
    assert_eq!(json["data"]["fileSize"], data.len());
    // Storage location is never exposed
    assert!(json["data"].get("filePath").is_none());
    let file_id = json["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/files/{file_id}");
    let (status, body) = common::get(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_bytes(), data);

    let (status, _) = common::delete(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::get(&app, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_image_uploads_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (state, token) = pro_state_with_upload_dir("nofiles@example.com", &dir).await;
    let app = common::app(&state);

    let auth = format!("Bearer {token}");
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    let (status, body) = common::post_raw(
        &app,
        "/api/v1/files/upload",
        &[
            ("Content-Type", content_type.as_str()),
            ("Authorization", auth.as_str()),
        ],
        multipart_file("notes.txt", "text/plain", b"hello"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        common::json(&body)["error"]["message"],
        "Only image uploads are supported."
    );
}

#[tokio::test]
async fn uploads_are_scoped_per_user() {
    let dir = tempfile::tempdir().unwrap();
    let (state, token) = pro_state_with_upload_dir("fileowner@example.com", &dir).await;
    let app = common::app(&state);

    let other = common::seed_user(&state.db, "fileother@example.com").await;
    common::seed_active_subscription(&state.db, other.id).await;
    let other_token = common::login(&state, &other).await.access_token;

    let auth = format!("Bearer {token}");
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    let (_, body) = common::post_raw(
        &app,
        "/api/v1/files/upload",
        &[
            ("Content-Type", content_type.as_str()),
            ("Authorization", auth.as_str()),
        ],
        multipart_file("mine.png", "image/png", b"png-bytes-stand-in"),
    )
    .await;
    let file_id = common::json(&body)["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/files/{file_id}");
    let (status, _) = common::get(&app, &uri, Some(&other_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = common::get(&app, "/api/v1/files", Some(&other_token)).await;
    assert!(common::json(&body)["data"].as_array().unwrap().is_empty());
}
