//! WebSocket frame DTOs

use serde::{Deserialize, Serialize};

/// Chat message pushed to every participant of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub from: i64,
    pub text: String,
    /// Unix time in milliseconds
    pub timestamp: i64,
}
