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
use crate::entities::tab_stash;
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_stash).get(list_stashes))
        .route(
            "/{id}",
            get(get_stash).put(update_stash).delete(delete_stash),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStashRequest {
    name: String,
    tabs: serde_json::Value,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStashRequest {
    name: Option<String>,
    tabs: Option<serde_json::Value>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListStashesQuery {
    workspace_id: Option<Uuid>,
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<tab_stash::Model, AppError> {
    tab_stash::Entity::find_by_id(id)
        .filter(tab_stash::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tab stash not found.".to_string()))
}

/// `POST /api/v1/tabstash`
async fn create_stash(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateStashRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }
    if !req.tabs.is_array() {
        return Err(AppError::BadRequest("tabs must be an array.".to_string()));
    }

    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let now = Utc::now().fixed_offset();
    let model = tab_stash::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        name: Set(req.name),
        tabs: Set(req.tabs),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/tabstash`
async fn list_stashes(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Query(query): Query<ListStashesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut select = tab_stash::Entity::find()
        .filter(tab_stash::Column::UserId.eq(identity.user_id()?));

    if let Some(workspace_id) = query.workspace_id {
        select = select.filter(tab_stash::Column::WorkspaceId.eq(workspace_id));
    }

    let stashes = select
        .order_by_desc(tab_stash::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(stashes))
}

/// `GET /api/v1/tabstash/{id}`
async fn get_stash(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PUT /api/v1/tabstash/{id}`
async fn update_stash(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStashRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = identity.user_id()?;
    let model = find_owned(&state, user_id, id).await?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }
    let mut active: tab_stash::ActiveModel = model.into();

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty.".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(tabs) = req.tabs {
        if !tabs.is_array() {
            return Err(AppError::BadRequest("tabs must be an array.".to_string()));
        }
        active.tabs = Set(tabs);
    }
    if let Some(workspace_id) = req.workspace_id {
        active.workspace_id = Set(Some(workspace_id));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}

/// `DELETE /api/v1/tabstash/{id}`
async fn delete_stash(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Tab stash deleted."))
}
