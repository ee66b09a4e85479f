use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use sea_orm::EntityTrait;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{jwt, oauth};
use crate::entities::user;
use crate::error::AppError;
use crate::response;
use crate::services::auth as auth_service;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google", get(google_initiate))
        .route("/google/callback", get(google_callback))
        .route("/github", get(github_initiate))
        .route("/github/callback", get(github_callback))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthInitiateQuery {
    pub redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequestBody {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequestBody {
    pub refresh_token: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Final leg shared by both provider callbacks: resolve the user, issue
/// tokens, and either redirect back to the extension or answer with JSON.
async fn complete_oauth_login(
    state: &AppState,
    profile: oauth::OAuthProfile,
    redirect_uri: Option<String>,
) -> Result<Response, AppError> {
    let provider = profile.provider.clone();
    let user_model = auth_service::find_or_create_user(&state.db, &profile).await?;
    let pair = auth_service::issue_token_pair(&state.db, &state.config, &user_model).await?;

    tracing::info!(user_id = %user_model.id, provider, "User logged in");

    if let Some(redirect_uri) = redirect_uri {
        let user_json = serde_json::to_string(&user_model).unwrap_or_else(|_| "{}".to_string());
        let redirect_url = format!(
            "{}?provider={}&token={}&refreshToken={}&user={}",
            redirect_uri,
            provider,
            urlencoding::encode(&pair.access_token),
            urlencoding::encode(&pair.refresh_token),
            urlencoding::encode(&user_json)
        );
        return Ok(Redirect::to(&redirect_url).into_response());
    }

    Ok(response::ok(serde_json::json!({
        "user": user_model,
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    }))
    .into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/auth/google`
async fn google_initiate(
    State(state): State<AppState>,
    Query(query): Query<OAuthInitiateQuery>,
) -> Result<Response, AppError> {
    if state.config.google_client_id.is_empty() {
        return Err(AppError::BadRequest(
            "Google OAuth is not configured.".to_string(),
        ));
    }

    let client = oauth::google_client(&state.config)?;
    let state_token =
        jwt::generate_oauth_state(&state.config.jwt_secret, query.redirect_uri.as_deref())?;

    let (auth_url, _csrf) = client
        .authorize_url(|| CsrfToken::new(state_token))
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .url();

    Ok(Redirect::to(auth_url.as_str()).into_response())
}

/// `GET /api/v1/auth/google/callback`
async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, AppError> {
    let state_claims = jwt::validate_oauth_state(&query.state, &state.config.jwt_secret)
        .map_err(|_| AppError::BadRequest("Invalid or expired OAuth state.".to_string()))?;

    let client = oauth::google_client(&state.config)?;
    let token_result = client
        .exchange_code(AuthorizationCode::new(query.code))
        .request_async(&reqwest::Client::new())
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to exchange authorization code: {e}")))?;

    let access_token = token_result.access_token().secret().clone();
    let profile = oauth::fetch_google_profile(&access_token).await?;

    complete_oauth_login(&state, profile, state_claims.redirect_uri).await
}

/// `GET /api/v1/auth/github`
async fn github_initiate(
    State(state): State<AppState>,
    Query(query): Query<OAuthInitiateQuery>,
) -> Result<Response, AppError> {
    if state.config.github_client_id.is_empty() {
        return Err(AppError::BadRequest(
            "GitHub OAuth is not configured.".to_string(),
        ));
    }

    let client = oauth::github_client(&state.config)?;
    let state_token =
        jwt::generate_oauth_state(&state.config.jwt_secret, query.redirect_uri.as_deref())?;

    let (auth_url, _csrf) = client
        .authorize_url(|| CsrfToken::new(state_token))
        .add_scope(Scope::new("user:email".to_string()))
        .url();

    Ok(Redirect::to(auth_url.as_str()).into_response())
}

/// `GET /api/v1/auth/github/callback`
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, AppError> {
    let state_claims = jwt::validate_oauth_state(&query.state, &state.config.jwt_secret)
        .map_err(|_| AppError::BadRequest("Invalid or expired OAuth state.".to_string()))?;

    let client = oauth::github_client(&state.config)?;
    let token_result = client
        .exchange_code(AuthorizationCode::new(query.code))
        .request_async(&reqwest::Client::new())
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to exchange authorization code: {e}")))?;

    let access_token = token_result.access_token().secret().clone();
    let profile = oauth::fetch_github_profile(&access_token).await?;

    complete_oauth_login(&state, profile, state_claims.redirect_uri).await
}

/// `POST /api/v1/auth/refresh`
///
/// Rotation: the old token is consumed with a single conditional delete; a
/// concurrent refresh that lost the race sees the row already gone and gets a
/// 401. Tokens are only reissued after the delete succeeded.
async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequestBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let claims =
        auth_service::verify_refresh_token(&state.db, &state.config, &body.refresh_token)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("Invalid or expired refresh token.".to_string())
            })?;

    let consumed = auth_service::consume_refresh_token(&state.db, &body.refresh_token).await?;
    if !consumed {
        return Err(AppError::Unauthorized(
            "Refresh token has already been used.".to_string(),
        ));
    }

    let user_id: Uuid = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token subject.".to_string()))?;
    let user_model = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;

    let pair = auth_service::issue_token_pair(&state.db, &state.config, &user_model).await?;

    Ok(response::ok(serde_json::json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    })))
}

/// `POST /api/v1/auth/logout`
///
/// Revokes the supplied refresh token. Always succeeds, even when the token
/// was already gone.
async fn logout(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequestBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth_service::revoke_refresh_token(&state.db, &body.refresh_token).await?;
    Ok(response::message("Logged out successfully."))
}
