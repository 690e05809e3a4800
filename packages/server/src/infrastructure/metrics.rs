//! Room and participant gauges.
//!
//! Values are kept in atomics owned by [`StreamMetrics`] and mirrored into the
//! `metrics` facade, so whichever recorder is installed (Prometheus in the
//! binary) sees the same numbers the process can inspect.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

pub const OPENED_CHATS_GAUGE: &str = "chat_stream_opened_chats";
pub const CONNECTED_CLIENTS_GAUGE: &str = "chat_stream_connected_clients";

/// Register gauge descriptions with the installed recorder.
pub fn describe() {
    metrics::describe_gauge!(OPENED_CHATS_GAUGE, "Number of open chat rooms");
    metrics::describe_gauge!(
        CONNECTED_CLIENTS_GAUGE,
        "Number of participant streams attached to open rooms"
    );
}

#[derive(Debug, Clone, Default)]
pub struct StreamMetrics {
    opened_chats: Arc<AtomicI64>,
    connected_clients: Arc<AtomicI64>,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_opened(&self) {
        let value = self.opened_chats.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!(OPENED_CHATS_GAUGE).set(value as f64);
    }

    pub fn chat_closed(&self) {
        let value = self.opened_chats.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::gauge!(OPENED_CHATS_GAUGE).set(value as f64);
    }

    pub fn client_connected(&self) {
        let value = self.connected_clients.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!(CONNECTED_CLIENTS_GAUGE).set(value as f64);
    }

    pub fn clients_disconnected(&self, count: usize) {
        if count == 0 {
            return;
        }
        let count = count as i64;
        let value = self.connected_clients.fetch_sub(count, Ordering::SeqCst) - count;
        metrics::gauge!(CONNECTED_CLIENTS_GAUGE).set(value as f64);
    }

    pub fn opened_chats(&self) -> i64 {
        self.opened_chats.load(Ordering::SeqCst)
    }

    pub fn connected_clients(&self) -> i64 {
        self.connected_clients.load(Ordering::SeqCst)
    }
}
