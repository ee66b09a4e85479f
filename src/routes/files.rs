use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
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
use crate::entities::file_upload;
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::state::AppState;

/// Uploads are capped at 10 MiB.
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/", get(list_files))
        .route("/{id}", get(download_file).delete(delete_file))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesQuery {
    workspace_id: Option<Uuid>,
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<file_upload::Model, AppError> {
    file_upload::Entity::find_by_id(id)
        .filter(file_upload::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found.".to_string()))
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `POST /api/v1/files/upload`
///
/// Multipart upload of a single `file` field. Only images are accepted; the
/// file lands under `{upload_dir}/{user_id}/` with a random prefix so
/// duplicate names never collide.
async fn upload_file(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = identity.user_id()?;

    let mut stored: Option<file_upload::Model> = None;
    let mut workspace_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart body.".to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("workspaceId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| AppError::BadRequest("Invalid workspaceId field.".to_string()))?;
                let parsed: Uuid = text
                    .parse()
                    .map_err(|_| AppError::BadRequest("Invalid workspaceId.".to_string()))?;
                workspaces::ensure_owned(&state, user_id, parsed).await?;
                workspace_id = Some(parsed);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(sanitize_file_name)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        AppError::BadRequest("A file name is required.".to_string())
                    })?;
                let mime_type = field.content_type().map(str::to_string);

                if !mime_type
                    .as_deref()
                    .is_some_and(|m| m.starts_with("image/"))
                {
                    return Err(AppError::BadRequest(
                        "Only image uploads are supported.".to_string(),
                    ));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Failed to read file data.".to_string()))?;
                if data.len() > MAX_FILE_SIZE {
                    return Err(AppError::BadRequest(
                        "File exceeds the 10MB upload limit.".to_string(),
                    ));
                }

                let id = Uuid::new_v4();
                let user_dir = std::path::Path::new(&state.config.upload_dir)
                    .join(user_id.to_string());
                tokio::fs::create_dir_all(&user_dir).await?;
                let disk_path = user_dir.join(format!("{id}_{file_name}"));
                tokio::fs::write(&disk_path, &data).await?;

                let model = file_upload::ActiveModel {
                    id: Set(id),
                    user_id: Set(user_id),
                    workspace_id: Set(workspace_id),
                    file_name: Set(file_name),
                    file_path: Set(disk_path.to_string_lossy().into_owned()),
                    file_type: Set(Some("image".to_string())),
                    file_size: Set(Some(data.len() as i64)),
                    mime_type: Set(mime_type),
                    metadata: Set(None),
                    created_at: Set(Utc::now().fixed_offset()),
                }
                .insert(&state.db)
                .await?;

                stored = Some(model);
            }
            _ => {}
        }
    }

    let model = stored
        .ok_or_else(|| AppError::BadRequest("A 'file' field is required.".to_string()))?;
    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/files`
async fn list_files(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut select = file_upload::Entity::find()
        .filter(file_upload::Column::UserId.eq(identity.user_id()?));

    if let Some(workspace_id) = query.workspace_id {
        select = select.filter(file_upload::Column::WorkspaceId.eq(workspace_id));
    }

    let files = select
        .order_by_desc(file_upload::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(files))
}

/// `GET /api/v1/files/{id}`
///
/// Returns the raw file bytes with the stored MIME type.
async fn download_file(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    let data = tokio::fs::read(&model.file_path)
        .await
        .map_err(|_| AppError::NotFound("File not found.".to_string()))?;

    let content_type = model
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", model.file_name),
            ),
        ],
        data,
    ))
}

/// `DELETE /api/v1/files/{id}`
async fn delete_file(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;

    if let Err(err) = tokio::fs::remove_file(&model.file_path).await {
        tracing::warn!(file_id = %model.id, "Failed to remove file from disk: {err}");
    }
    model.delete(&state.db).await?;

    Ok(response::message("File deleted."))
}
