//! Process-wide table of live rooms.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
    domain::{ChatId, ChatRoom, RoomDirectory},
    infrastructure::metrics::StreamMetrics,
};

use super::{
    driver::{self, DriverSettings},
    room::Room,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("chat room {0} is already open")]
    AlreadyExists(ChatId),
}

/// Maps chat ids to live rooms.
///
/// Lookups share the read lock; creation and eviction take the write lock.
/// Each room guards its own participants, so work on one room never waits
/// on another.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<ChatId, Arc<Room>>>,
    settings: DriverSettings,
    metrics: StreamMetrics,
}

impl RoomRegistry {
    pub fn new(settings: DriverSettings, metrics: StreamMetrics) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> DriverSettings {
        self.settings
    }

    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }

    /// Register a new room without starting its driver.
    pub async fn create_room(&self, id: ChatId) -> Result<Arc<Room>, RegistryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }

        let room = Arc::new(Room::new(id, self.metrics.clone()));
        rooms.insert(id, Arc::clone(&room));
        self.metrics.chat_opened();
        tracing::info!(chat_id = %id, "room opened");
        Ok(room)
    }

    /// Register a new room and start its driver.
    pub async fn open_room(self: &Arc<Self>, id: ChatId) -> Result<Arc<Room>, RegistryError> {
        let room = self.create_room(id).await?;
        driver::spawn(Arc::clone(self), Arc::clone(&room));
        Ok(room)
    }

    pub async fn lookup(&self, id: ChatId) -> Option<Arc<Room>> {
        self.rooms.read().await.get(&id).cloned()
    }

    /// Close `room` and remove it from the table.
    ///
    /// Only the call that actually removes the entry decrements the gauge, so
    /// concurrent evictions of the same room count once. Returns whether this
    /// call removed it.
    pub async fn evict_room(&self, room: &Room) -> bool {
        room.close().await;

        let removed = {
            let mut rooms = self.rooms.write().await;
            match rooms.get(&room.id()) {
                Some(registered) if std::ptr::eq(registered.as_ref(), room) => {
                    rooms.remove(&room.id()).is_some()
                }
                _ => false,
            }
        };

        if removed {
            room.mark_closed();
            self.metrics.chat_closed();
            tracing::info!(chat_id = %room.id(), "room evicted");
        }
        removed
    }

    pub async fn evict_room_by_id(&self, id: ChatId) -> bool {
        match self.lookup(id).await {
            Some(room) => self.evict_room(&room).await,
            None => false,
        }
    }
}

#[async_trait]
impl RoomDirectory for RoomRegistry {
    async fn find_room(&self, chat_id: ChatId) -> Option<Arc<dyn ChatRoom>> {
        self.lookup(chat_id)
            .await
            .map(|room| room as Arc<dyn ChatRoom>)
    }

    async fn evict(&self, chat_id: ChatId) -> bool {
        self.evict_room_by_id(chat_id).await
    }
}
