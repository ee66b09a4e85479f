use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait};
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::entities::user;
use crate::error::AppError;
use crate::response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMeRequest {
    name: Option<String>,
    avatar_url: Option<String>,
}

/// `GET /api/v1/users/me`
async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_model = user::Entity::find_by_id(identity.user_id()?)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(response::ok(user_model))
}

/// `PUT /api/v1/users/me`
async fn update_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(req): Json<UpdateMeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_model = user::Entity::find_by_id(identity.user_id()?)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    if let Some(name) = req.name {
        active.name = Set(Some(name));
    }
    if let Some(avatar_url) = req.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}
