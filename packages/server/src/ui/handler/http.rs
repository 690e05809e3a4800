//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    domain::{AuthenticatedIdentity, ChatId},
    infrastructure::dto::http::{ChatDetailDto, CreateChatResponse, SendMessageRequest},
    ui::{error::ApiError, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Prometheus text exposition of the room and participant gauges
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| ApiError::not_found("metrics recorder is not installed"))
}

/// Create a chat and open its live room
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CreateChatResponse>), ApiError> {
    let id = state.create_chat_usecase.execute().await?;
    state.registry.open_room(id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateChatResponse { id: id.value() }),
    ))
}

/// Get chat detail by ID
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
) -> Result<Json<ChatDetailDto>, ApiError> {
    let chat = state
        .get_chat_usecase
        .execute(ChatId::new(chat_id))
        .await?;
    Ok(Json(chat.into()))
}

/// Hand a message to the chat's live room
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    identity: AuthenticatedIdentity,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .send_message_usecase
        .execute(ChatId::new(chat_id), identity.user_id, request.text)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tear down the live room, then delete the chat if the caller may
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    identity: AuthenticatedIdentity,
) -> Result<impl IntoResponse, ApiError> {
    state
        .delete_chat_usecase
        .execute(ChatId::new(chat_id), identity.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
