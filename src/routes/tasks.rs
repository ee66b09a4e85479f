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

use crate::auth::middleware::AuthUser;
use crate::entities::task;
use crate::routes::workspaces;
use crate::error::AppError;
use crate::response;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/{id}/toggle", patch(toggle_task))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    workspace_id: Option<Uuid>,
    parent_task_id: Option<Uuid>,
    priority: Option<String>,
    due_date: Option<chrono::DateTime<Utc>>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    position: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    workspace_id: Option<Uuid>,
    completed: Option<bool>,
    priority: Option<String>,
    due_date: Option<chrono::DateTime<Utc>>,
    category: Option<String>,
    tags: Option<Vec<String>>,
    position: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksQuery {
    workspace_id: Option<Uuid>,
    category: Option<String>,
    completed: Option<bool>,
    priority: Option<String>,
    /// When absent, only top-level tasks are listed.
    parent_task_id: Option<Uuid>,
}

const PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];
const MAX_TITLE_LEN: usize = 500;

fn validate_priority(priority: &str) -> Result<(), AppError> {
    if PRIORITIES.contains(&priority) {
        return Ok(());
    }
    Err(AppError::BadRequest(format!(
        "Invalid priority: {priority}"
    )))
}

async fn find_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<task::Model, AppError> {
    task::Entity::find_by_id(id)
        .filter(task::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found.".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/v1/tasks`
async fn create_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required.".to_string()));
    }
    if req.title.len() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(
            "Title must be at most 500 characters.".to_string(),
        ));
    }

    let priority = req.priority.unwrap_or_else(|| "medium".to_string());
    validate_priority(&priority)?;

    let user_id = identity.user_id()?;

    // A subtask must hang off one of the caller's own tasks
    if let Some(parent_id) = req.parent_task_id {
        find_owned(&state, user_id, parent_id).await?;
    }
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let now = Utc::now().fixed_offset();
    let model = task::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        parent_task_id: Set(req.parent_task_id),
        title: Set(req.title),
        description: Set(req.description),
        completed: Set(false),
        priority: Set(priority),
        due_date: Set(req.due_date.map(|t| t.fixed_offset())),
        category: Set(req.category),
        tags: Set(serde_json::json!(req.tags.unwrap_or_default())),
        position: Set(req.position.unwrap_or(0)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/tasks`
async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut select = task::Entity::find()
        .filter(task::Column::UserId.eq(identity.user_id()?));

    if let Some(workspace_id) = query.workspace_id {
        select = select.filter(task::Column::WorkspaceId.eq(workspace_id));
    }
    if let Some(category) = query.category {
        select = select.filter(task::Column::Category.eq(category));
    }
    if let Some(completed) = query.completed {
        select = select.filter(task::Column::Completed.eq(completed));
    }
    if let Some(priority) = query.priority {
        select = select.filter(task::Column::Priority.eq(priority));
    }
    select = match query.parent_task_id {
        Some(parent_id) => select.filter(task::Column::ParentTaskId.eq(parent_id)),
        None => select.filter(task::Column::ParentTaskId.is_null()),
    };

    let tasks = select
        .order_by_asc(task::Column::Position)
        .order_by_desc(task::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(tasks))
}

/// `GET /api/v1/tasks/{id}`
async fn get_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PUT /api/v1/tasks/{id}`
async fn update_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = identity.user_id()?;
    let model = find_owned(&state, user_id, id).await?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }
    let mut active: task::ActiveModel = model.into();

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty.".to_string()));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(AppError::BadRequest(
                "Title must be at most 500 characters.".to_string(),
            ));
        }
        active.title = Set(title);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    if let Some(workspace_id) = req.workspace_id {
        active.workspace_id = Set(Some(workspace_id));
    }
    if let Some(completed) = req.completed {
        active.completed = Set(completed);
    }
    if let Some(priority) = req.priority {
        validate_priority(&priority)?;
        active.priority = Set(priority);
    }
    if let Some(due_date) = req.due_date {
        active.due_date = Set(Some(due_date.fixed_offset()));
    }
    if let Some(category) = req.category {
        active.category = Set(Some(category));
    }
    if let Some(tags) = req.tags {
        active.tags = Set(serde_json::json!(tags));
    }
    if let Some(position) = req.position {
        active.position = Set(position);
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}

/// `PATCH /api/v1/tasks/{id}/toggle`
async fn toggle_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    let completed = !model.completed;
    let mut active: task::ActiveModel = model.into();
    active.completed = Set(completed);
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}

/// `DELETE /api/v1/tasks/{id}`
async fn delete_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Task deleted."))
}
