use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::ProUser;
use crate::entities::integration;
use crate::error::AppError;
use crate::response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_integration).get(list_integrations))
        .route(
            "/{id}",
            get(get_integration)
                .put(update_integration)
                .delete(delete_integration),
        )
        .route("/{id}/sync", post(sync_integration))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntegrationRequest {
    service: String,
    access_token: String,
    refresh_token: Option<String>,
    token_expires_at: Option<chrono::DateTime<Utc>>,
    metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIntegrationRequest {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_expires_at: Option<chrono::DateTime<Utc>>,
    metadata: Option<serde_json::Value>,
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<integration::Model, AppError> {
    integration::Entity::find_by_id(id)
        .filter(integration::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Integration not found.".to_string()))
}

/// `POST /api/v1/integrations`
async fn create_integration(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateIntegrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.service.trim().is_empty() {
        return Err(AppError::BadRequest("Service is required.".to_string()));
    }
    if req.access_token.is_empty() {
        return Err(AppError::BadRequest("accessToken is required.".to_string()));
    }

    let now = Utc::now().fixed_offset();
    let model = integration::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(identity.user_id()?),
        service: Set(req.service),
        access_token: Set(req.access_token),
        refresh_token: Set(req.refresh_token),
        token_expires_at: Set(req.token_expires_at.map(|t| t.fixed_offset())),
        metadata: Set(req.metadata),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/integrations`
async fn list_integrations(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let integrations = integration::Entity::find()
        .filter(integration::Column::UserId.eq(identity.user_id()?))
        .order_by_desc(integration::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(integrations))
}

/// `GET /api/v1/integrations/{id}`
async fn get_integration(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PUT /api/v1/integrations/{id}`
async fn update_integration(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateIntegrationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    let mut active: integration::ActiveModel = model.into();

    if let Some(access_token) = req.access_token {
        active.access_token = Set(access_token);
    }
    if let Some(refresh_token) = req.refresh_token {
        active.refresh_token = Set(Some(refresh_token));
    }
    if let Some(token_expires_at) = req.token_expires_at {
        active.token_expires_at = Set(Some(token_expires_at.fixed_offset()));
    }
    if let Some(metadata) = req.metadata {
        active.metadata = Set(Some(metadata));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}

/// `DELETE /api/v1/integrations/{id}`
async fn delete_integration(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Integration deleted."))
}

/// `POST /api/v1/integrations/{id}/sync`
///
/// Provider sync runs in an external worker; this endpoint only acknowledges
/// the request.
async fn sync_integration(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    tracing::info!(
        integration_id = %model.id,
        service = %model.service,
        "Integration sync requested"
    );

    Ok(response::ok(serde_json::json!({ "synced": 0 })))
}
