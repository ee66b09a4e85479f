use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::ProUser;
use crate::entities::sync_data;
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(push_data).get(list_data))
        .route("/{data_type}", get(get_data).delete(delete_data))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushDataRequest {
    data_type: String,
    data: serde_json::Value,
    version: Option<i64>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeQuery {
    workspace_id: Option<Uuid>,
}

fn scope_condition(user_id: Uuid, data_type: &str, workspace_id: Option<Uuid>) -> Condition {
    let mut condition = Condition::all()
        .add(sync_data::Column::UserId.eq(user_id))
        .add(sync_data::Column::DataType.eq(data_type));
    condition = match workspace_id {
        Some(workspace_id) => condition.add(sync_data::Column::WorkspaceId.eq(workspace_id)),
        None => condition.add(sync_data::Column::WorkspaceId.is_null()),
    };
    condition
}

/// `POST /api/v1/sync`
///
/// Upserts the blob for `(user, dataType, workspace)`. A client pushing a
/// newer version than the stored one wins outright; a stale or equal version
/// still overwrites but bumps the stored version so other clients notice.
async fn push_data(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<PushDataRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.data_type.trim().is_empty() {
        return Err(AppError::BadRequest("dataType is required.".to_string()));
    }

    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let txn = state.db.begin().await?;

    let existing = sync_data::Entity::find()
        .filter(scope_condition(user_id, &req.data_type, req.workspace_id))
        .one(&txn)
        .await?;

    let now = Utc::now().fixed_offset();
    let model = match existing {
        Some(found) => {
            let incoming = req.version.unwrap_or(0);
            let version = if incoming > found.version {
                incoming
            } else {
                found.version + 1
            };

            let mut active: sync_data::ActiveModel = found.into();
            active.data = Set(req.data);
            active.version = Set(version);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            sync_data::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                workspace_id: Set(req.workspace_id),
                data_type: Set(req.data_type),
                data: Set(req.data),
                version: Set(req.version.unwrap_or(1)),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;
    Ok(response::ok(model))
}

/// `GET /api/v1/sync`
async fn list_data(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let entries = sync_data::Entity::find()
        .filter(sync_data::Column::UserId.eq(identity.user_id()?))
        .order_by_asc(sync_data::Column::DataType)
        .all(&state.db)
        .await?;

    Ok(response::ok(entries))
}

/// `GET /api/v1/sync/{data_type}`
async fn get_data(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(data_type): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let entry = sync_data::Entity::find()
        .filter(scope_condition(
            identity.user_id()?,
            &data_type,
            query.workspace_id,
        ))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sync data not found.".to_string()))?;

    Ok(response::ok(entry))
}

/// `DELETE /api/v1/sync/{data_type}`
async fn delete_data(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(data_type): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = sync_data::Entity::delete_many()
        .filter(scope_condition(
            identity.user_id()?,
            &data_type,
            query.workspace_id,
        ))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Sync data not found.".to_string()));
    }
    Ok(response::message("Sync data deleted."))
}
