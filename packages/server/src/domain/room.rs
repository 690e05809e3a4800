//! Live room abstractions
//!
//! A room is the in-process side of a chat: which participants currently have
//! a stream attached, and the queue of messages waiting to be fanned out.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatId, ChatMessage, RoomError, UserId};

/// Per-connection outbound sink: messages sent here are pushed to the
/// participant's stream.
pub type ParticipantSink = mpsc::UnboundedSender<ChatMessage>;

/// Room lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Registered and schedulable
    Active,
    /// Teardown started: sinks dropped, no further enqueue accepted
    Draining,
    /// Removed from the registry
    Closed,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRoom: Send + Sync {
    fn id(&self) -> ChatId;

    fn state(&self) -> RoomState;

    /// Register `sink` for `user_id`, replacing any previous sink for that user.
    async fn attach(&self, user_id: UserId, sink: ParticipantSink);

    /// Remove the sink for `user_id` if present.
    async fn detach(&self, user_id: UserId);

    async fn is_empty(&self) -> bool;

    /// Hand a message over for fan-out.
    ///
    /// The queue holds one message: this returns once the message is queued,
    /// which may be before the driver has taken it. A second producer waits
    /// until the slot frees up. Fails with [`RoomError::Closed`] as soon as
    /// the room is no longer active, including while waiting.
    async fn enqueue(&self, message: ChatMessage) -> Result<(), RoomError>;

    /// Deliver every message that is immediately available to all attached
    /// sinks, without waiting. Returns the number of messages delivered.
    async fn fan_out_once(&self) -> Result<usize, RoomError>;

    /// Begin teardown: stop accepting messages and drop every sink.
    async fn close(&self);
}

/// Lookup and eviction of live rooms, as seen by the use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn find_room(&self, chat_id: ChatId) -> Option<Arc<dyn ChatRoom>>;

    /// Tear down and unregister the room. Returns `false` if no room was live.
    async fn evict(&self, chat_id: ChatId) -> bool;
}
