//! Domain layer
//!
//! Value objects, the chat membership entity, and the traits the use cases
//! depend on. Concrete implementations live in the infrastructure layer.

pub mod auth;
pub mod entity;
pub mod error;
pub mod repository;
pub mod room;
pub mod value_object;

pub use auth::{AuthService, AuthenticatedIdentity};
pub use entity::{Chat, ChatMessage};
pub use error::{AuthServiceError, ErrorKind, RepositoryError, RoomError, ValueObjectError};
pub use repository::ChatRepository;
pub use room::{ChatRoom, ParticipantSink, RoomDirectory, RoomState};
pub use value_object::{ChatId, MessageText, Timestamp, UserId};

#[cfg(test)]
pub use auth::MockAuthService;
#[cfg(test)]
pub use repository::MockChatRepository;
#[cfg(test)]
pub use room::{MockChatRoom, MockRoomDirectory};
