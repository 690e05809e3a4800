//! Shared fixtures for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use engawa_relay::{
    domain::{AuthService, AuthServiceError, UserId},
    infrastructure::{
        broadcast::{DriverSettings, RoomRegistry},
        metrics::StreamMetrics,
        rate_limiter::TokenBucket,
        repository::InMemoryChatRepository,
    },
    ui::{
        build_router,
        guard::{AccessClaims, DEFAULT_GUARDED_METHODS, StreamAccessGuard},
        state::AppState,
    },
};
use engawa_shared::time::{FixedClock, now_millis};
use jsonwebtoken::{EncodingKey, Header, encode};

pub const SECRET: &str = "integration-secret";

/// Authorization service that answers every delete check the same way.
pub struct FixedRights(pub bool);

#[async_trait]
impl AuthService for FixedRights {
    async fn can_delete(&self, _user_id: UserId) -> Result<bool, AuthServiceError> {
        Ok(self.0)
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub registry: Arc<RoomRegistry>,
    pub state: Arc<AppState>,
}

pub fn create_test_app(
    settings: DriverSettings,
    can_delete: bool,
    limiter: Option<TokenBucket>,
) -> TestApp {
    let registry = Arc::new(RoomRegistry::new(settings, StreamMetrics::new()));
    let state = AppState::new(
        registry.clone(),
        Arc::new(InMemoryChatRepository::new()),
        Arc::new(FixedRights(can_delete)),
        Arc::new(FixedClock::new(1_700_000_000_000)),
    );
    let guard = Arc::new(StreamAccessGuard::new(DEFAULT_GUARDED_METHODS, SECRET));
    let state = Arc::new(state);
    let router = build_router(Arc::clone(&state), guard, limiter.map(Arc::new));
    TestApp {
        router,
        registry,
        state,
    }
}

/// Signed access token for `user_id` granting `scope`.
pub fn token(user_id: i64, scope: &[&str]) -> String {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        scope: scope.iter().map(|s| s.to_string()).collect(),
        exp: (now_millis() / 1000 + 3600) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn full_scope() -> Vec<&'static str> {
    DEFAULT_GUARDED_METHODS.to_vec()
}
