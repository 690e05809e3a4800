//! Domain errors
//!
//! Each collaborator boundary has its own error enum. [`ErrorKind`] is the
//! transport-independent classification the UI layer maps to status codes.

use thiserror::Error;

use super::value_object::ChatId;

/// Error classification shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Room or entity absent
    NotFound,
    /// Missing or invalid credential
    Unauthenticated,
    /// Valid credential, insufficient scope or denied by the authorization service
    PermissionDenied,
    /// Business rule violation
    DomainLogic,
    /// Admission control rejected the call
    ResourceExhausted,
    /// Persistence or transport failure
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("message text must not be empty")]
    EmptyMessage,

    #[error("message text is too long ({length} characters, max {max})")]
    MessageTooLong { length: usize, max: usize },
}

/// Persistence collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("chat {0} not found in store")]
    ChatNotFound(ChatId),

    /// Failure inside a transactional operation; the transaction was rolled back.
    #[error("transaction rolled back: {0}")]
    Transaction(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Authorization collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthServiceError {
    #[error("authorization service unavailable: {0}")]
    Unavailable(String),

    #[error("authorization service rejected the request: {0}")]
    Rejected(String),

    #[error("invalid response from authorization service: {0}")]
    InvalidResponse(String),
}

/// Live room errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("chat room {0} is closed")]
    Closed(ChatId),
}
