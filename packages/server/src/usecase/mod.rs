//! UseCase layer
//!
//! One struct per operation. Each holds the domain traits it needs behind
//! `Arc<dyn _>` so tests can swap in mocks.

mod connect_participant;
mod create_chat;
mod delete_chat;
mod error;
mod get_chat;
mod send_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use create_chat::CreateChatUseCase;
pub use delete_chat::DeleteChatUseCase;
pub use error::ServiceError;
pub use get_chat::GetChatUseCase;
pub use send_message::SendMessageUseCase;
