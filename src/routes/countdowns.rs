use axum::extract::{Path, Query, State};
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
use crate::entities::countdown_timer;
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_countdown).get(list_countdowns))
        .route(
            "/{id}",
            get(get_countdown)
                .put(update_countdown)
                .delete(delete_countdown),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCountdownRequest {
    name: String,
    target_date: chrono::DateTime<Utc>,
    notify_before: Option<i32>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCountdownRequest {
    name: Option<String>,
    target_date: Option<chrono::DateTime<Utc>>,
    notify_before: Option<i32>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCountdownsQuery {
    workspace_id: Option<Uuid>,
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<countdown_timer::Model, AppError> {
    countdown_timer::Entity::find_by_id(id)
        .filter(countdown_timer::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Countdown timer not found.".to_string()))
}

/// `POST /api/v1/countdowns`
async fn create_countdown(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateCountdownRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }

    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let now = Utc::now().fixed_offset();
    let model = countdown_timer::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        name: Set(req.name),
        target_date: Set(req.target_date.fixed_offset()),
        notify_before: Set(req.notify_before),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/countdowns`
async fn list_countdowns(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Query(query): Query<ListCountdownsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut select = countdown_timer::Entity::find()
        .filter(countdown_timer::Column::UserId.eq(identity.user_id()?));

    if let Some(workspace_id) = query.workspace_id {
        select = select.filter(countdown_timer::Column::WorkspaceId.eq(workspace_id));
    }

    let countdowns = select
        .order_by_asc(countdown_timer::Column::TargetDate)
        .all(&state.db)
        .await?;

    Ok(response::ok(countdowns))
}

/// `GET /api/v1/countdowns/{id}`
async fn get_countdown(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PUT /api/v1/countdowns/{id}`
async fn update_countdown(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCountdownRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = identity.user_id()?;
    let model = find_owned(&state, user_id, id).await?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }
    let mut active: countdown_timer::ActiveModel = model.into();

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty.".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(target_date) = req.target_date {
        active.target_date = Set(target_date.fixed_offset());
    }
    if let Some(notify_before) = req.notify_before {
        active.notify_before = Set(Some(notify_before));
    }
    if let Some(workspace_id) = req.workspace_id {
        active.workspace_id = Set(Some(workspace_id));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}

/// `DELETE /api/v1/countdowns/{id}`
async fn delete_countdown(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Countdown timer deleted."))
}
