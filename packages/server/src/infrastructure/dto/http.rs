//! HTTP API DTOs

use serde::{Deserialize, Serialize};

/// Response body of chat creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatResponse {
    pub id: i64,
}

/// Chat detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDetailDto {
    pub id: i64,
    pub user_ids: Vec<i64>,
    /// RFC 3339, UTC
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Error body shared by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
