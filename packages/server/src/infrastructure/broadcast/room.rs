//! Live chat room.
//!
//! ## 責務
//!
//! - 接続中の参加者ストリーム（sink）の管理
//! - 送信待ちメッセージのハンドオフキュー
//! - ルームのライフサイクル状態（Active → Draining → Closed）
//!
//! The outbound queue has a single consumer, the room driver, so messages
//! are fanned out in enqueue order.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, RwLock, mpsc, watch},
    time::{Duration, Instant},
};

use crate::{
    domain::{ChatId, ChatMessage, ChatRoom, ParticipantSink, RoomError, RoomState, UserId},
    infrastructure::metrics::StreamMetrics,
};

/// Messages that may sit in the handoff queue before producers have to wait.
/// One slot rather than a rendezvous: `enqueue` can return before the driver
/// has picked the message up.
const OUTBOUND_CAPACITY: usize = 1;

struct Members {
    sinks: HashMap<UserId, ParticipantSink>,
    /// Last time the room was seen occupied
    last_activity: Instant,
}

pub struct Room {
    id: ChatId,
    members: RwLock<Members>,
    outbound_tx: mpsc::Sender<ChatMessage>,
    outbound_rx: Mutex<mpsc::Receiver<ChatMessage>>,
    state: watch::Sender<RoomState>,
    metrics: StreamMetrics,
}

impl Room {
    pub fn new(id: ChatId, metrics: StreamMetrics) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (state, _) = watch::channel(RoomState::Active);
        Self {
            id,
            members: RwLock::new(Members {
                sinks: HashMap::new(),
                last_activity: Instant::now(),
            }),
            outbound_tx,
            outbound_rx: Mutex::new(outbound_rx),
            state,
            metrics,
        }
    }

    pub fn is_active(&self) -> bool {
        *self.state.borrow() == RoomState::Active
    }

    /// Resolves once teardown has started.
    pub async fn closed(&self) {
        let mut state = self.state.subscribe();
        let _ = state.wait_for(|state| *state != RoomState::Active).await;
    }

    pub async fn participant_count(&self) -> usize {
        self.members.read().await.sinks.len()
    }

    /// Time since the room was last seen occupied.
    pub async fn idle_for(&self) -> Duration {
        self.members.read().await.last_activity.elapsed()
    }

    pub async fn touch(&self) {
        self.members.write().await.last_activity = Instant::now();
    }

    /// Wait for the next message in the handoff queue.
    pub(crate) async fn next_message(&self) -> Option<ChatMessage> {
        let mut outbound = self.outbound_rx.lock().await;
        outbound.recv().await
    }

    /// Push a copy of `message` to every attached sink.
    ///
    /// A sink whose stream is gone is skipped; the others still receive the
    /// message. Returns the number of successful deliveries.
    pub(crate) async fn deliver(&self, message: &ChatMessage) -> usize {
        let members = self.members.read().await;
        let mut delivered = 0;
        for (user_id, sink) in &members.sinks {
            if sink.send(message.clone()).is_err() {
                tracing::warn!(
                    chat_id = %self.id,
                    user_id = %user_id,
                    "participant stream is gone, message dropped"
                );
            } else {
                delivered += 1;
            }
        }
        tracing::debug!(chat_id = %self.id, from = %message.from, delivered, "message fanned out");
        delivered
    }

    pub(crate) fn mark_closed(&self) {
        self.state.send_replace(RoomState::Closed);
    }
}

#[async_trait]
impl ChatRoom for Room {
    fn id(&self) -> ChatId {
        self.id
    }

    fn state(&self) -> RoomState {
        *self.state.borrow()
    }

    async fn attach(&self, user_id: UserId, sink: ParticipantSink) {
        let mut members = self.members.write().await;
        // checked under the lock so a concurrent close cannot miss this sink
        if !self.is_active() {
            tracing::debug!(chat_id = %self.id, user_id = %user_id, "room is not active, sink dropped");
            return;
        }
        if members.sinks.is_empty() {
            members.last_activity = Instant::now();
        }
        if members.sinks.insert(user_id, sink).is_none() {
            self.metrics.client_connected();
        }
        tracing::debug!(chat_id = %self.id, user_id = %user_id, "participant attached");
    }

    async fn detach(&self, user_id: UserId) {
        let mut members = self.members.write().await;
        if members.sinks.remove(&user_id).is_some() {
            self.metrics.clients_disconnected(1);
            tracing::debug!(chat_id = %self.id, user_id = %user_id, "participant detached");
        }
    }

    async fn is_empty(&self) -> bool {
        self.members.read().await.sinks.is_empty()
    }

    async fn enqueue(&self, message: ChatMessage) -> Result<(), RoomError> {
        let mut state = self.state.subscribe();
        if *state.borrow_and_update() != RoomState::Active {
            return Err(RoomError::Closed(self.id));
        }

        tokio::select! {
            sent = self.outbound_tx.send(message) => sent.map_err(|_| RoomError::Closed(self.id)),
            _ = state.changed() => Err(RoomError::Closed(self.id)),
        }
    }

    async fn fan_out_once(&self) -> Result<usize, RoomError> {
        if !self.is_active() {
            return Err(RoomError::Closed(self.id));
        }
        // Another consumer is already waiting on the queue.
        let Ok(mut outbound) = self.outbound_rx.try_lock() else {
            return Ok(0);
        };

        let mut drained = 0;
        loop {
            match outbound.try_recv() {
                Ok(message) => {
                    self.deliver(&message).await;
                    drained += 1;
                }
                Err(mpsc::error::TryRecvError::Empty) => return Ok(drained),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(RoomError::Closed(self.id));
                }
            }
        }
    }

    async fn close(&self) {
        let started = self.state.send_if_modified(|state| {
            if *state == RoomState::Active {
                *state = RoomState::Draining;
                true
            } else {
                false
            }
        });
        if !started {
            return;
        }

        if let Ok(mut outbound) = self.outbound_rx.try_lock() {
            outbound.close();
        }

        let mut members = self.members.write().await;
        let dropped = members.sinks.len();
        members.sinks.clear();
        self.metrics.clients_disconnected(dropped);
        tracing::info!(chat_id = %self.id, dropped, "room closed");
    }
}
