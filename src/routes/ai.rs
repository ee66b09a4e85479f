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
use crate::entities::ai_conversation;
use crate::error::AppError;
use crate::response;
use crate::routes::workspaces;
use crate::services::ai::{self, ChatMessage};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversations", post(create_conversation).get(list_conversations))
        .route(
            "/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/conversations/{id}/message", post(send_message))
        .route("/summarize", post(summarize))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateConversationRequest {
    title: Option<String>,
    conversation_type: Option<String>,
    workspace_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct SendMessageRequest {
    content: String,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    text: String,
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<ai_conversation::Model, AppError> {
    ai_conversation::Entity::find_by_id(id)
        .filter(ai_conversation::Column::UserId.eq(user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found.".to_string()))
}

/// `POST /api/v1/ai/conversations`
async fn create_conversation(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = identity.user_id()?;
    if let Some(workspace_id) = req.workspace_id {
        workspaces::ensure_owned(&state, user_id, workspace_id).await?;
    }

    let now = Utc::now().fixed_offset();
    let model = ai_conversation::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        workspace_id: Set(req.workspace_id),
        conversation_type: Set(req.conversation_type.unwrap_or_else(|| "chat".to_string())),
        title: Set(req.title),
        messages: Set(serde_json::json!([])),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, response::ok(model)))
}

/// `GET /api/v1/ai/conversations`
async fn list_conversations(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let conversations = ai_conversation::Entity::find()
        .filter(ai_conversation::Column::UserId.eq(identity.user_id()?))
        .order_by_desc(ai_conversation::Column::UpdatedAt)
        .all(&state.db)
        .await?;

    Ok(response::ok(conversations))
}

/// `GET /api/v1/ai/conversations/{id}`
async fn get_conversation(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    Ok(response::ok(model))
}

/// `DELETE /api/v1/ai/conversations/{id}`
async fn delete_conversation(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let model = find_owned(&state, identity.user_id()?, id).await?;
    model.delete(&state.db).await?;
    Ok(response::message("Conversation deleted."))
}

/// `POST /api/v1/ai/conversations/{id}/message`
///
/// Appends the user message, asks the configured provider for a reply, and
/// appends that too before returning the updated conversation.
async fn send_message(
    State(state): State<AppState>,
    ProUser(identity): ProUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("Message content is required.".to_string()));
    }

    let model = find_owned(&state, identity.user_id()?, id).await?;

    let mut messages: Vec<ChatMessage> =
        serde_json::from_value(model.messages.clone()).unwrap_or_default();
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: req.content,
        timestamp: Some(Utc::now().to_rfc3339()),
    });

    let reply = ai::chat(&state.config, &messages).await?;
    messages.push(ChatMessage {
        role: "assistant".to_string(),
        content: reply.clone(),
        timestamp: Some(Utc::now().to_rfc3339()),
    });

    let mut active: ai_conversation::ActiveModel = model.into();
    active.messages = Set(serde_json::to_value(&messages)?);
    active.updated_at = Set(Utc::now().fixed_offset());
    let updated = active.update(&state.db).await?;

    Ok(response::ok(serde_json::json!({
        "reply": reply,
        "conversation": updated,
    })))
}

/// `POST /api/v1/ai/summarize`
async fn summarize(
    State(state): State<AppState>,
    ProUser(_identity): ProUser,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is required.".to_string()));
    }

    let summary = ai::summarize(&state.config, &req.text).await?;
    Ok(response::ok(serde_json::json!({ "summary": summary })))
}
