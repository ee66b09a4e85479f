use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::ProUser;
use crate::entities::{pomodoro_session, task};
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/stats", get(get_stats))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/start", patch(start_session))
        .route("/{id}/complete", patch(complete_session))
}

const SESSION_TYPES: [&str; 3] = ["work", "short_break", "long_break"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    duration: i32,
    session_type: Option<String>,
    workspace_id: Option<Uuid>,
    task_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSessionsQuery {
    workspace_id: Option<Uuid>,
    task_id: Option<Uuid>,
    completed: Option<bool>,
    start_date: Option<chrono::DateTime<Utc>>,
    end_date: Option<chrono::DateTime<Utc>>,
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<pomodoro_session::Model, AppError> {
    pomodoro_session::Entity::find_by_id(id)
        .filter(pomodoro_session::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Pomodoro session not found.".to_string()))
}

/// `POST /api/v1/pomodoro`
async fn create_session(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.duration <= 0 {
        return Err(AppError::BadRequest(
            "Duration must be a positive number of minutes.".to_string(),
        ));
    }

    let session_type = req.session_type.unwrap_or_else(|| "work".to_string());
    if !SESSION_TYPES.contains(&session_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Invalid session type: {session_type}"
        )));
    }

    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }
    if let Some(task_id) = req.task_id {
        task::Entity::find_by_id(task_id)
            .filter(task::Column::UserId.eq(user_id))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found.".to_string()))?;
    }

    let model = pomodoro_session::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        task_id: Set(req.task_id),
        duration: Set(req.duration),
        session_type: Set(session_type),
        completed: Set(false),
        started_at: Set(None),
        completed_at: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/pomodoro`
async fn list_sessions(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut select = pomodoro_session::Entity::find()
        .filter(pomodoro_session::Column::UserId.eq(identity.user_id()?));

    if let Some(workspace_id) = query.workspace_id {
        select = select.filter(pomodoro_session::Column::WorkspaceId.eq(workspace_id));
    }
    if let Some(task_id) = query.task_id {
        select = select.filter(pomodoro_session::Column::TaskId.eq(task_id));
    }
    if let Some(completed) = query.completed {
        select = select.filter(pomodoro_session::Column::Completed.eq(completed));
    }
    if let Some(start) = query.start_date {
        select = select.filter(pomodoro_session::Column::CreatedAt.gte(start.fixed_offset()));
    }
    if let Some(end) = query.end_date {
        select = select.filter(pomodoro_session::Column::CreatedAt.lte(end.fixed_offset()));
    }

    let sessions = select
        .order_by_desc(pomodoro_session::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(sessions))
}

/// `GET /api/v1/pomodoro/stats`
///
/// Count and total minutes of completed sessions, grouped by session type.
async fn get_stats(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let sessions = pomodoro_session::Entity::find()
        .filter(pomodoro_session::Column::UserId.eq(identity.user_id()?))
        .filter(pomodoro_session::Column::Completed.eq(true))
        .all(&state.db)
        .await?;

    let mut by_type: BTreeMap<String, (u64, i64)> = BTreeMap::new();
    for session in &sessions {
        let entry = by_type.entry(session.session_type.clone()).or_default();
        entry.0 += 1;
        entry.1 += i64::from(session.duration);
    }

    let stats: BTreeMap<String, serde_json::Value> = by_type
        .into_iter()
        .map(|(session_type, (count, total))| {
            (
                session_type,
                serde_json::json!({ "count": count, "totalMinutes": total }),
            )
        })
        .collect();

    Ok(response::ok(serde_json::json!({
        "totalSessions": sessions.len(),
        "byType": stats,
    })))
}

/// `GET /api/v1/pomodoro/{id}`
async fn get_session(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PATCH /api/v1/pomodoro/{id}/start`
async fn start_session(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    let mut active: pomodoro_session::ActiveModel = model.into();
    active.started_at = Set(Some(Utc::now().fixed_offset()));
    let updated = active.update(&state.db).await?;

    Ok(response::ok(updated))
}

/// `PATCH /api/v1/pomodoro/{id}/complete`
async fn complete_session(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    let mut active: pomodoro_session::ActiveModel = model.into();
    active.completed = Set(true);
    active.completed_at = Set(Some(Utc::now().fixed_offset()));
    let updated = active.update(&state.db).await?;

    Ok(response::ok(updated))
}

/// `DELETE /api/v1/pomodoro/{id}`
async fn delete_session(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Pomodoro session deleted."))
}
