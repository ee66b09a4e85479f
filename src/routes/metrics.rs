use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::ProUser;
use crate::entities::metric;
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_metric).get(list_metrics))
        .route("/{id}", get(get_metric).delete(delete_metric))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMetricRequest {
    metric_type: String,
    value: Option<f64>,
    date: Option<NaiveDate>,
    workspace_id: Option<Uuid>,
    metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMetricsQuery {
    metric_type: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    workspace_id: Option<Uuid>,
}

async fn find_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<metric::Model, AppError> {
    metric::Entity::find_by_id(id)
        .filter(metric::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Metric not found.".to_string()))
}

/// `POST /api/v1/metrics`
async fn create_metric(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateMetricRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.metric_type.trim().is_empty() {
        return Err(AppError::BadRequest("metricType is required.".to_string()));
    }

    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let model = metric::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        metric_type: Set(req.metric_type),
        value: Set(req.value),
        date: Set(req.date.unwrap_or_else(|| Utc::now().date_naive())),
        metadata: Set(req.metadata),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/metrics`
async fn list_metrics(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Query(query): Query<ListMetricsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut select = metric::Entity::find()
        .filter(metric::Column::UserId.eq(identity.user_id()?));

    if let Some(metric_type) = query.metric_type {
        select = select.filter(metric::Column::MetricType.eq(metric_type));
    }
    if let Some(start) = query.start_date {
        select = select.filter(metric::Column::Date.gte(start));
    }
    if let Some(end) = query.end_date {
        select = select.filter(metric::Column::Date.lte(end));
    }
    if let Some(workspace_id) = query.workspace_id {
        select = select.filter(metric::Column::WorkspaceId.eq(workspace_id));
    }

    let metrics = select
        .order_by_desc(metric::Column::Date)
        .all(&state.db)
        .await?;

    Ok(response::ok(metrics))
}

/// `GET /api/v1/metrics/{id}`
async fn get_metric(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `DELETE /api/v1/metrics/{id}`
async fn delete_metric(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Metric deleted."))
}
