//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{
    AuthServiceError, ChatId, ErrorKind, RepositoryError, UserId, ValueObjectError,
};

/// Errors returned at the use case boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("chat {0} not found")]
    ChatNotFound(ChatId),

    #[error("chat {0} has no live room")]
    RoomNotLive(ChatId),

    /// The room was torn down while the message was being handed over
    #[error("chat room {0} was closed")]
    RoomClosed(ChatId),

    #[error("user {0} is not allowed to delete chats")]
    PermissionDenied(UserId),

    #[error("invalid message: {0}")]
    InvalidMessage(#[from] ValueObjectError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    AuthService(#[from] AuthServiceError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChatNotFound(_) | Self::RoomNotLive(_) | Self::RoomClosed(_) => {
                ErrorKind::NotFound
            }
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::InvalidMessage(_) => ErrorKind::DomainLogic,
            Self::Repository(_) | Self::AuthService(_) => ErrorKind::Internal,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::ChatNotFound(id) => Self::ChatNotFound(id),
            other => Self::Repository(other),
        }
    }
}
