//! Domain entities

use super::value_object::{ChatId, MessageText, Timestamp, UserId};

/// Chat membership record
///
/// Records every participant that has ever connected to the chat. This is
/// independent of the live room: detaching a stream does not remove the
/// user from `user_ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    /// Assigned by the store on save; `None` until then
    pub id: Option<ChatId>,
    pub user_ids: Vec<UserId>,
    pub created_at: Timestamp,
}

impl Chat {
    /// Create a chat that has not been saved yet
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            id: None,
            user_ids: Vec::new(),
            created_at,
        }
    }

    /// Rebuild a stored chat
    pub fn restore(id: ChatId, user_ids: Vec<UserId>, created_at: Timestamp) -> Self {
        Self {
            id: Some(id),
            user_ids,
            created_at,
        }
    }

    /// Add a participant to the membership set.
    ///
    /// Returns `false` if the user was already a member (no-op).
    pub fn connect(&mut self, user_id: UserId) -> bool {
        if self.user_ids.contains(&user_id) {
            return false;
        }
        self.user_ids.push(user_id);
        true
    }
}

/// Message fanned out to every attached participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: UserId,
    pub text: MessageText,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(from: UserId, text: MessageText, timestamp: Timestamp) -> Self {
        Self {
            from,
            text,
            timestamp,
        }
    }
}
