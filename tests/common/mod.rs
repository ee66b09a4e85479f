#![allow(clippy::unwrap_used)]
#![allow(dead_code)] // not every test file uses every helper

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use momentum_api::auth::jwt::TokenPair;
use momentum_api::config::{Config, Environment};
use momentum_api::entities::{subscription, user};
use momentum_api::services::auth as auth_service;
use momentum_api::services::pro_cache::ProCache;
use momentum_api::state::AppState;

/// Build application state against a fresh in-memory database.
pub async fn test_state() -> AppState {
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    AppState {
        db,
        config: Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "access-secret-for-testing-only-32char".to_string(),
            jwt_refresh_secret: "refresh-secret-for-testing-32char".to_string(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604_800,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_redirect_uri: String::new(),
            github_client_id: String::new(),
            github_client_secret: String::new(),
            github_redirect_uri: String::new(),
            frontend_url: "http://localhost:5173".to_string(),
            stripe_secret_key: String::new(),
            stripe_webhook_secret: "whsec_test".to_string(),
            stripe_price_id: "price_test".to_string(),
            ai_provider: "openai".to_string(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            upload_dir: "test_uploads".to_string(),
        },
        pro_cache: ProCache::new(),
    }
}

pub fn app(state: &AppState) -> Router {
    momentum_api::routes::router().with_state(state.clone())
}

/// Insert a user directly, sidestepping the OAuth flow.
pub async fn seed_user(db: &DatabaseConnection, email: &str) -> user::Model {
    let now = Utc::now().fixed_offset();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        name: Set(Some("Test User".to_string())),
        avatar_url: Set(None),
        provider: Set("google".to_string()),
        provider_id: Set(Some(Uuid::new_v4().to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}

/// Issue a real token pair for a seeded user.
pub async fn login(state: &AppState, user_model: &user::Model) -> TokenPair {
    auth_service::issue_token_pair(&state.db, &state.config, user_model)
        .await
        .unwrap()
}

/// Seed an active subscription with a period end well in the future.
pub async fn seed_active_subscription(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> subscription::Model {
    let now = Utc::now();
    subscription::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        stripe_subscription_id: Set(Some(format!("sub_{}", Uuid::new_v4()))),
        stripe_customer_id: Set(Some("cus_test".to_string())),
        status: Set("active".to_string()),
        plan: Set("pro".to_string()),
        current_period_start: Set(Some(now.fixed_offset())),
        current_period_end: Set(Some((now + chrono::Duration::days(30)).fixed_offset())),
        cancel_at_period_end: Set(false),
        created_at: Set(now.fixed_offset()),
        updated_at: Set(now.fixed_offset()),
    }
    .insert(db)
    .await
    .unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    send(app, "GET", uri, token, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, String) {
    send(app, "POST", uri, token, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, String) {
    send(app, "PUT", uri, token, Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    send(app, "PATCH", uri, token, None).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    send(app, "DELETE", uri, token, None).await
}

/// POST a raw body with arbitrary headers (webhook and multipart tests).
pub async fn post_raw(
    app: &Router,
    uri: &str,
    headers: &[(&str, &str)],
    body: Vec<u8>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method("POST").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body)).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}
