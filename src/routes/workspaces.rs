use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::workspace;
use crate::error::AppError;
use crate::response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_workspace).get(list_workspaces))
        .route(
            "/{id}",
            get(get_workspace)
                .put(update_workspace)
                .delete(delete_workspace),
        )
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorkspaceRequest {
    name: String,
    #[serde(default)]
    is_default: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateWorkspaceRequest {
    name: Option<String>,
    is_default: Option<bool>,
}

// ============================================================================
// Helpers
// ============================================================================

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<workspace::Model, AppError> {
    workspace::Entity::find_by_id(id)
        .filter(workspace::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Workspace not found.".to_string()))
}

/// Confirm the workspace exists and belongs to the caller.
///
/// Resource routers call this before attaching a row to a client-supplied
/// workspace ID, so an unknown or foreign workspace surfaces as a 404 instead
/// of a foreign-key failure.
///
/// # Errors
///
/// Returns `NotFound` when the workspace is absent or owned by someone else.
pub async fn ensure_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    find_owned(state, user_id, id).await.map(|_| ())
}

/// Clear the default flag on all of the user's workspaces, inside the caller's
/// transaction, so the subsequent set keeps the one-default invariant atomic.
async fn unset_defaults(txn: &DatabaseTransaction, user_id: Uuid) -> Result<(), AppError> {
    let defaults = workspace::Entity::find()
        .filter(workspace::Column::UserId.eq(user_id))
        .filter(workspace::Column::IsDefault.eq(true))
        .all(txn)
        .await?;

    for found in defaults {
        let mut active: workspace::ActiveModel = found.into();
        active.is_default = Set(false);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(txn).await?;
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/v1/workspaces`
async fn create_workspace(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }

    let user_id = identity.user_id()?;
    let now = Utc::now().fixed_offset();

    let txn = state.db.begin().await?;
    if req.is_default {
        unset_defaults(&txn, user_id).await?;
    }

    let model = workspace::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(req.name),
        is_default: Set(req.is_default),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/workspaces`
async fn list_workspaces(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let workspaces = workspace::Entity::find()
        .filter(workspace::Column::UserId.eq(identity.user_id()?))
        .order_by_desc(workspace::Column::IsDefault)
        .order_by_asc(workspace::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(workspaces))
}

/// `GET /api/v1/workspaces/{id}`
async fn get_workspace(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PUT /api/v1/workspaces/{id}`
///
/// Switching the default runs unset-then-set inside one transaction.
async fn update_workspace(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateWorkspaceRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = identity.user_id()?;
    let model = find_owned(&state, user_id, id).await?;

    let txn = state.db.begin().await?;
    if req.is_default == Some(true) {
        unset_defaults(&txn, user_id).await?;
    }

    let mut active: workspace::ActiveModel = model.into();
    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty.".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(is_default) = req.is_default {
        active.is_default = Set(is_default);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(response::ok(updated))
}

/// `DELETE /api/v1/workspaces/{id}`
async fn delete_workspace(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    if model.is_default {
        return Err(AppError::BadRequest(
            "Cannot delete the default workspace.".to_string(),
        ));
    }

    model.delete(&state.db).await?;
    Ok(response::message("Workspace deleted."))
}
