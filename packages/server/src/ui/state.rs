//! Shared application state.

use std::sync::Arc;

use engawa_shared::time::Clock;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::watch;

use crate::{
    domain::{AuthService, ChatRepository},
    infrastructure::broadcast::RoomRegistry,
    usecase::{
        ConnectParticipantUseCase, CreateChatUseCase, DeleteChatUseCase, GetChatUseCase,
        SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// 稼働中ルームのレジストリ（ルームの開始に使用）
    pub registry: Arc<RoomRegistry>,
    pub create_chat_usecase: Arc<CreateChatUseCase>,
    pub get_chat_usecase: Arc<GetChatUseCase>,
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub delete_chat_usecase: Arc<DeleteChatUseCase>,
    /// Renders `/metrics`; `None` when no Prometheus recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
    /// Flips to `true` once the server starts shutting down
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Wire every use case against the given collaborators.
    pub fn new(
        registry: Arc<RoomRegistry>,
        repository: Arc<dyn ChatRepository>,
        auth: Arc<dyn AuthService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            create_chat_usecase: Arc::new(CreateChatUseCase::new(
                repository.clone(),
                clock.clone(),
            )),
            get_chat_usecase: Arc::new(GetChatUseCase::new(repository.clone())),
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                repository.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(registry.clone(), clock)),
            delete_chat_usecase: Arc::new(DeleteChatUseCase::new(
                registry.clone(),
                repository,
                auth,
            )),
            registry,
            metrics_handle: None,
            shutdown: watch::Sender::new(false),
        }
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Tell every open connect stream to end.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
