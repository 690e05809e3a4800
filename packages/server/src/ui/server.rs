//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{MethodRouter, delete, get, post},
};
use engawa_shared::time::SystemClock;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;

use crate::infrastructure::{
    auth_client::HttpAuthService,
    broadcast::{DriverSettings, RoomRegistry},
    metrics::StreamMetrics,
    rate_limiter::TokenBucket,
    repository::InMemoryChatRepository,
};

use super::{
    admission::admission_middleware,
    guard::{
        CONNECT_METHOD, CREATE_METHOD, DELETE_METHOD, GET_METHOD, GuardedMethod,
        SEND_MESSAGE_METHOD, StreamAccessGuard, access_middleware,
    },
    handler::{
        connect_handler, create_chat, delete_chat, get_chat, health_check, metrics, send_message,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Runtime settings of the relay
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub auth_service_url: String,
    pub guarded_methods: Vec<String>,
    pub driver: DriverSettings,
    /// `(max_tokens, period)`; `None` disables admission control
    pub rate_limit: Option<(u64, Duration)>,
}

/// Build the API router.
///
/// Each route is tagged with its method name for the access guard. The
/// limiter, when present, sits in front of Connect and SendMessage.
pub fn build_router(
    state: Arc<AppState>,
    guard: Arc<StreamAccessGuard>,
    limiter: Option<Arc<TokenBucket>>,
) -> Router {
    let guarded = |route: MethodRouter<Arc<AppState>>, method: &'static str| {
        route.route_layer(middleware::from_fn_with_state(
            GuardedMethod::new(Arc::clone(&guard), method),
            access_middleware,
        ))
    };
    let admitted = |route: MethodRouter<Arc<AppState>>| match &limiter {
        Some(limiter) => route.route_layer(middleware::from_fn_with_state(
            Arc::clone(limiter),
            admission_middleware,
        )),
        None => route,
    };

    Router::new()
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/chats", guarded(post(create_chat), CREATE_METHOD))
        .route(
            "/api/chats/{chat_id}",
            guarded(get(get_chat), GET_METHOD).merge(guarded(delete(delete_chat), DELETE_METHOD)),
        )
        .route(
            "/api/chats/{chat_id}/connect",
            admitted(guarded(get(connect_handler), CONNECT_METHOD)),
        )
        .route(
            "/api/chats/{chat_id}/messages",
            admitted(guarded(post(send_message), SEND_MESSAGE_METHOD)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Chat relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(config).with_metrics_handle(handle);
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    metrics_handle: Option<PrometheusHandle>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            metrics_handle: None,
        }
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Run the relay until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address
    /// or if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let config = self.config;

        // Initialize dependencies in order:
        // 1. Room registry
        // 2. Collaborators (store, authorization service)
        // 3. AppState with use cases
        // 4. Guard and limiter
        let registry = Arc::new(RoomRegistry::new(config.driver, StreamMetrics::new()));
        let repository = Arc::new(InMemoryChatRepository::new());
        let auth = Arc::new(HttpAuthService::new(config.auth_service_url.clone()));

        let mut state = AppState::new(registry, repository, auth, Arc::new(SystemClock));
        if let Some(handle) = self.metrics_handle {
            state = state.with_metrics_handle(handle);
        }

        let guard = Arc::new(StreamAccessGuard::new(
            config.guarded_methods.iter().cloned(),
            &config.jwt_secret,
        ));
        guard.ensure_identity_methods_guarded()?;
        let limiter = config
            .rate_limit
            .map(|(max_tokens, period)| Arc::new(TokenBucket::new(max_tokens, period)));

        let state = Arc::new(state);
        let app = build_router(Arc::clone(&state), guard, limiter);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat relay listening on {}", listener.local_addr()?);
        tracing::info!(
            garbage_cycle = ?config.driver.garbage_cycle,
            chat_expiration = ?config.driver.chat_expiration,
            guarded = ?config.guarded_methods,
            "room policy"
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Upgraded sockets are not tracked by graceful shutdown, so the
        // streams are told to end on their own.
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                state.request_shutdown();
            })
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
