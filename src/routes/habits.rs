use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::ProUser;
use crate::entities::{habit, habit_entry};
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_habit).get(list_habits))
        .route(
            "/{id}",
            get(get_habit).put(update_habit).delete(delete_habit),
        )
        .route("/{id}/checkin", post(checkin))
        .route("/{id}/entries", get(list_entries))
        .route("/{id}/streak", get(get_streak))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateHabitRequest {
    name: String,
    description: Option<String>,
    color: Option<String>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateHabitRequest {
    name: Option<String>,
    description: Option<String>,
    color: Option<String>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckinRequest {
    date: Option<NaiveDate>,
    completed: Option<bool>,
    notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntriesQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

async fn find_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<habit::Model, AppError> {
    habit::Entity::find_by_id(id)
        .filter(habit::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Habit not found.".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/v1/habits`
async fn create_habit(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateHabitRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required.".to_string()));
    }

    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let now = Utc::now().fixed_offset();
    let model = habit::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        name: Set(req.name),
        description: Set(req.description),
        color: Set(req.color),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/habits`
async fn list_habits(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let habits = habit::Entity::find()
        .filter(habit::Column::UserId.eq(identity.user_id()?))
        .order_by_desc(habit::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(habits))
}

/// `GET /api/v1/habits/{id}`
async fn get_habit(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `PUT /api/v1/habits/{id}`
async fn update_habit(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHabitRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = identity.user_id()?;
    let model = find_owned(&state, user_id, id).await?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }
    let mut active: habit::ActiveModel = model.into();

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty.".to_string()));
        }
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    if let Some(color) = req.color {
        active.color = Set(Some(color));
    }
    if let Some(workspace_id) = req.workspace_id {
        active.workspace_id = Set(Some(workspace_id));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&state.db).await?;
    Ok(response::ok(updated))
}

/// `DELETE /api/v1/habits/{id}`
async fn delete_habit(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Habit deleted."))
}

/// `POST /api/v1/habits/{id}/checkin`
///
/// Upserts the entry for the given day (defaults to today). With no explicit
/// `completed` value an existing entry is toggled and a new one marked done.
async fn checkin(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CheckinRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let habit_model = find_owned(&state, identity.user_id()?, id).await?;
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());

    let existing = habit_entry::Entity::find()
        .filter(habit_entry::Column::HabitId.eq(habit_model.id))
        .filter(habit_entry::Column::Date.eq(date))
        .one(&state.db)
        .await?;

    let entry = if let Some(found) = existing {
        let completed = req.completed.unwrap_or(!found.completed);
        let mut active: habit_entry::ActiveModel = found.into();
        active.completed = Set(completed);
        if let Some(notes) = req.notes {
            active.notes = Set(Some(notes));
        }
        active.update(&state.db).await?
    } else {
        habit_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            habit_id: Set(habit_model.id),
            date: Set(date),
            completed: Set(req.completed.unwrap_or(true)),
            notes: Set(req.notes),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&state.db)
        .await?
    };

    Ok(response::ok(entry))
}

/// `GET /api/v1/habits/{id}/entries`
async fn list_entries(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let habit_model = find_owned(&state, identity.user_id()?, id).await?;

    let mut select = habit_entry::Entity::find()
        .filter(habit_entry::Column::HabitId.eq(habit_model.id));
    if let Some(start) = query.start_date {
        select = select.filter(habit_entry::Column::Date.gte(start));
    }
    if let Some(end) = query.end_date {
        select = select.filter(habit_entry::Column::Date.lte(end));
    }

    let entries = select
        .order_by_desc(habit_entry::Column::Date)
        .all(&state.db)
        .await?;

    Ok(response::ok(entries))
}

/// `GET /api/v1/habits/{id}/streak`
///
/// Counts consecutive completed days ending today.
async fn get_streak(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let habit_model = find_owned(&state, identity.user_id()?, id).await?;

    let entries = habit_entry::Entity::find()
        .filter(habit_entry::Column::HabitId.eq(habit_model.id))
        .filter(habit_entry::Column::Completed.eq(true))
        .order_by_desc(habit_entry::Column::Date)
        .all(&state.db)
        .await?;

    let mut streak = 0u32;
    let mut expected = Utc::now().date_naive();
    for entry in entries {
        if entry.date == expected {
            streak += 1;
            expected -= Duration::days(1);
        } else {
            break;
        }
    }

    Ok(response::ok(serde_json::json!({ "streak": streak })))
}
