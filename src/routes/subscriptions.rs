use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::response;
use crate::services::subscription;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_subscription))
        .route("/check", get(check_subscription))
        .route("/cancel", post(cancel_subscription))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CancelRequest {
    cancel_immediately: Option<bool>,
}

/// `GET /api/v1/subscriptions`
async fn get_subscription(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let subscription =
        subscription::get_active_subscription(&state.db, identity.user_id()?).await?;
    Ok(response::ok(subscription))
}

/// `GET /api/v1/subscriptions/check`
async fn check_subscription(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let has_pro = subscription::has_active_subscription(&state, identity.user_id()?).await?;
    Ok(response::ok(serde_json::json!({
        "hasActiveSubscription": has_pro,
    })))
}

/// `POST /api/v1/subscriptions/cancel`
///
/// Defaults to cancelling at period end; `cancelImmediately` drops access now.
async fn cancel_subscription(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(req): Json<CancelRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = identity.user_id()?;
    let immediately = req.cancel_immediately.unwrap_or(false);

    let cancelled =
        subscription::cancel_subscription(&state.db, &state.pro_cache, user_id, immediately)
            .await?;

    match cancelled {
        Some(model) => Ok(response::ok(model)),
        None => Err(AppError::NotFound(
            "No active subscription found.".to_string(),
        )),
    }
}
