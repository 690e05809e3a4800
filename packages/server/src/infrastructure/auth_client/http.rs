//! HTTP client for the authorization service.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{AuthService, AuthServiceError, UserId};

#[derive(Debug, Deserialize)]
struct RightsResponse {
    can: bool,
}

/// Asks the authorization service whether a user holds delete rights.
///
/// `GET {base_url}/api/users/{id}/rights` answers `{ "can": bool }`.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn rights_url(&self, user_id: UserId) -> String {
        format!(
            "{}/api/users/{}/rights",
            self.base_url.trim_end_matches('/'),
            user_id
        )
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn can_delete(&self, user_id: UserId) -> Result<bool, AuthServiceError> {
        let resp = self
            .client
            .get(self.rights_url(user_id))
            .send()
            .await
            .map_err(|e| AuthServiceError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthServiceError::Rejected(e.to_string()))?;

        let rights: RightsResponse = resp
            .json()
            .await
            .map_err(|e| AuthServiceError::InvalidResponse(e.to_string()))?;

        tracing::debug!(user_id = %user_id, can = rights.can, "delete rights checked");
        Ok(rights.can)
    }
}
