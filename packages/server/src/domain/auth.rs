//! Authentication and authorization types.

use async_trait::async_trait;

use super::{AuthServiceError, UserId};

/// Identity bound to one request or stream after its access token was verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: UserId,
    /// Fully-qualified method names the credential may invoke
    pub scope: Vec<String>,
}

impl AuthenticatedIdentity {
    pub fn new(user_id: UserId, scope: Vec<String>) -> Self {
        Self { user_id, scope }
    }

    pub fn can_invoke(&self, method: &str) -> bool {
        self.scope.iter().any(|allowed| allowed == method)
    }
}

/// Remote authorization check, consulted only on delete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn can_delete(&self, user_id: UserId) -> Result<bool, AuthServiceError>;
}
