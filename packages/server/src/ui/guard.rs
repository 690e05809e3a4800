//! Access guard for stream and message methods.
//!
//! Every API method has a fully-qualified name. Calls to a guarded method must
//! carry `Authorization: Bearer <jwt>`; the token is verified with HS256 and
//! its `scope` claim must list the method. On success the caller's
//! [`AuthenticatedIdentity`] is stored in the request extensions, where
//! handlers pick it up as an extractor.
//!
//! A WebSocket stream is checked once, on the upgrade request.
//!
//! Connect, SendMessage and Delete act as the calling user, so a guard that
//! leaves any of them unguarded is rejected at startup.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AuthenticatedIdentity, ErrorKind, UserId};

use super::error::ApiError;

pub const CREATE_METHOD: &str = "/chat_v1.ChatV1/Create";
pub const GET_METHOD: &str = "/chat_v1.ChatV1/Get";
pub const CONNECT_METHOD: &str = "/chat_v1.ChatV1/Connect";
pub const SEND_MESSAGE_METHOD: &str = "/chat_v1.ChatV1/SendMessage";
pub const DELETE_METHOD: &str = "/chat_v1.ChatV1/Delete";

pub const DEFAULT_GUARDED_METHODS: [&str; 3] =
    [CONNECT_METHOD, SEND_MESSAGE_METHOD, DELETE_METHOD];

/// Methods whose handlers need the caller's identity
pub const IDENTITY_METHODS: [&str; 3] = [CONNECT_METHOD, SEND_MESSAGE_METHOD, DELETE_METHOD];

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id, as a decimal string
    pub sub: String,
    /// Method names the token may invoke
    #[serde(default)]
    pub scope: Vec<String>,
    /// Expiry, seconds since the Unix epoch
    pub exp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("missing access token")]
    MissingCredential,

    #[error("authorization header is not a bearer token")]
    MalformedCredential,

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("access token subject is not a user id: {0}")]
    InvalidSubject(String),

    #[error("access token does not grant {0}")]
    OutOfScope(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} acts as the calling user and must stay in the guarded methods")]
pub struct UnguardedIdentityMethod(pub &'static str);

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfScope(_) => ErrorKind::PermissionDenied,
            _ => ErrorKind::Unauthenticated,
        }
    }
}

pub struct StreamAccessGuard {
    guarded_methods: HashSet<String>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl StreamAccessGuard {
    pub fn new<I, S>(guarded_methods: I, secret: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            guarded_methods: guarded_methods.into_iter().map(Into::into).collect(),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn is_guarded(&self, method: &str) -> bool {
        self.guarded_methods.contains(method)
    }

    /// Fails on the first identity method this guard lets through.
    pub fn ensure_identity_methods_guarded(&self) -> Result<(), UnguardedIdentityMethod> {
        match IDENTITY_METHODS
            .into_iter()
            .find(|method| !self.is_guarded(method))
        {
            Some(method) => Err(UnguardedIdentityMethod(method)),
            None => Ok(()),
        }
    }

    /// Verify the credential for one call to `method`.
    ///
    /// Returns `Ok(None)` for methods that are not guarded.
    pub fn check(
        &self,
        method: &str,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedIdentity>, AccessError> {
        if !self.is_guarded(method) {
            return Ok(None);
        }

        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AccessError::MissingCredential)?;
        let token = value
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .ok_or(AccessError::MalformedCredential)?;

        let claims = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AccessError::InvalidToken(e.to_string()))?
            .claims;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| AccessError::InvalidSubject(claims.sub.clone()))?;

        let identity = AuthenticatedIdentity::new(user_id, claims.scope);
        if !identity.can_invoke(method) {
            return Err(AccessError::OutOfScope(method.to_string()));
        }
        Ok(Some(identity))
    }
}

/// Middleware state: the guard plus the method name of the route it wraps.
#[derive(Clone)]
pub struct GuardedMethod {
    guard: Arc<StreamAccessGuard>,
    method: &'static str,
}

impl GuardedMethod {
    pub fn new(guard: Arc<StreamAccessGuard>, method: &'static str) -> Self {
        Self { guard, method }
    }
}

pub async fn access_middleware(
    State(route): State<GuardedMethod>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match route.guard.check(route.method, request.headers()) {
        Ok(Some(identity)) => {
            tracing::debug!(method = route.method, user_id = %identity.user_id, "access granted");
            request.extensions_mut().insert(identity);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(method = route.method, "access denied: {}", e);
            return Err(e.into());
        }
    }
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or_else(|| AccessError::MissingCredential.into())
    }
}
