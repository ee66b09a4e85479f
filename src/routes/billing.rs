use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::response;
use crate::services::stripe::{self, StripeClient, WebhookEvent};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/webhook", post(handle_webhook))
        .route("/success", get(checkout_success))
        .route("/cancel", get(checkout_cancel))
}

/// `POST /api/v1/billing/checkout`
async fn create_checkout(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.config.stripe_secret_key.is_empty() || state.config.stripe_price_id.is_empty() {
        return Err(AppError::BadRequest(
            "Billing is not configured.".to_string(),
        ));
    }

    let client = StripeClient::new(&state.config.stripe_secret_key);
    let session = client
        .create_checkout_session(
            identity.user_id()?,
            &state.config.stripe_price_id,
            &format!("{}/billing/success", state.config.frontend_url),
            &format!("{}/billing/cancel", state.config.frontend_url),
        )
        .await?;

    Ok(response::ok(serde_json::json!({
        "sessionId": session.id,
        "url": session.url,
    })))
}

/// `POST /api/v1/billing/webhook`
///
/// Stripe posts the raw event body here. The signature is checked before
/// anything is parsed or mutated; Stripe retries on any non-2xx response.
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !stripe::verify_signature(&body, signature, &state.config.stripe_webhook_secret) {
        return Err(AppError::BadRequest(
            "Invalid webhook signature.".to_string(),
        ));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid webhook payload.".to_string()))?;

    tracing::info!(event_type = %event.event_type, "Processing Stripe webhook");
    stripe::reconcile_event(&state, &event).await?;

    Ok(response::ok(serde_json::json!({ "received": true })))
}

/// `GET /api/v1/billing/success`
async fn checkout_success() -> Json<serde_json::Value> {
    response::message("Checkout completed. Your subscription will activate shortly.")
}

/// `GET /api/v1/billing/cancel`
async fn checkout_cancel() -> Json<serde_json::Value> {
    response::message("Checkout cancelled.")
}
