//! Per-room driver task.
//!
//! Waits on three sources at once: the eviction ticker, the room's handoff
//! queue and the room's close signal. Messages are fanned out as soon as they
//! arrive; a room left empty for longer than `chat_expiration` is evicted on
//! the first tick after crossing that threshold.
//!
//! A driver that panics takes its room down with it: the room is evicted and
//! later `enqueue` calls fail with `RoomError::Closed`.

use std::{future::Future, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use tokio::{
    task::JoinHandle,
    time::{Duration, Instant, MissedTickBehavior, interval_at},
};
use tracing::Instrument;

use crate::domain::{ChatRoom, RoomError};

use super::{registry::RoomRegistry, room::Room};

/// Shortest eviction interval a driver will tick at.
pub const MIN_GARBAGE_CYCLE: Duration = Duration::from_millis(1);

/// Longest eviction interval a driver will tick at.
pub const MAX_GARBAGE_CYCLE: Duration = Duration::from_secs(24 * 60 * 60);

/// Timing policy shared by every room driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// Interval between eviction checks
    pub garbage_cycle: Duration,
    /// How long a room may stay empty before it is evicted
    pub chat_expiration: Duration,
}

impl DriverSettings {
    /// `garbage_cycle` clamped to what a ticker can run at.
    pub fn tick_period(&self) -> Duration {
        self.garbage_cycle.clamp(MIN_GARBAGE_CYCLE, MAX_GARBAGE_CYCLE)
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            garbage_cycle: Duration::from_secs(10),
            chat_expiration: Duration::from_secs(60),
        }
    }
}

/// Start the driver for a freshly registered room.
pub fn spawn(registry: Arc<RoomRegistry>, room: Arc<Room>) -> JoinHandle<()> {
    let span = tracing::info_span!("room_driver", chat_id = %room.id());
    let driver = run(Arc::clone(&registry), Arc::clone(&room));
    tokio::spawn(supervise(registry, room, driver).instrument(span))
}

/// Run `driver`, evicting the room if it panics.
async fn supervise<F>(registry: Arc<RoomRegistry>, room: Arc<Room>, driver: F)
where
    F: Future<Output = ()>,
{
    if AssertUnwindSafe(driver).catch_unwind().await.is_err() {
        tracing::error!("driver panicked, evicting room");
        registry.evict_room(&room).await;
    }
}

async fn run(registry: Arc<RoomRegistry>, room: Arc<Room>) {
    let settings = registry.settings();
    let period = settings.tick_period();
    let Some(first_tick) = Instant::now().checked_add(period) else {
        tracing::error!(?period, "eviction ticker cannot be scheduled, evicting room");
        registry.evict_room(&room).await;
        return;
    };
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!("driver started");

    loop {
        tokio::select! {
            _ = room.closed() => {
                tracing::debug!("room closed externally, driver stopping");
                break;
            }
            _ = ticker.tick() => {
                if room.is_empty().await {
                    let idle = room.idle_for().await;
                    if idle > settings.chat_expiration {
                        tracing::info!(idle_secs = idle.as_secs(), "room expired, evicting");
                        registry.evict_room(&room).await;
                        break;
                    }
                } else {
                    room.touch().await;
                }
            }
            Some(message) = room.next_message() => {
                room.deliver(&message).await;
                if let Err(RoomError::Closed(_)) = room.fan_out_once().await {
                    break;
                }
            }
        }
    }

    tracing::debug!("driver stopped");
}
