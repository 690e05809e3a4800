//! Conversion logic between DTOs and domain entities.

use engawa_shared::time::timestamp_to_rfc3339;

use crate::domain::{Chat, ChatMessage};

use super::{http::ChatDetailDto, websocket::ChatMessageDto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<ChatMessage> for ChatMessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            from: model.from.value(),
            text: model.text.into_string(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<Chat> for ChatDetailDto {
    /// A chat that was never saved converts with id 0.
    fn from(model: Chat) -> Self {
        Self {
            id: model.id.map(|id| id.value()).unwrap_or_default(),
            user_ids: model.user_ids.iter().map(|id| id.value()).collect(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}
