//! Transport error type.
//!
//! Every failure a handler can return ends up as an [`ApiError`]: a status
//! code derived from the error's [`ErrorKind`] and a JSON `{ "error": msg }`
//! body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::ErrorKind,
    infrastructure::{broadcast::RegistryError, dto::http::ErrorResponse},
    usecase::ServiceError,
};

use super::guard::AccessError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(status_for(kind), message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::NotFound, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::ResourceExhausted, message)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::DomainLogic => StatusCode::BAD_REQUEST,
        ErrorKind::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        let kind = error.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = ?error, "internal error");
        }
        Self::from_kind(kind, error.to_string())
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        Self::from_kind(error.kind(), error.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        tracing::error!(error = ?error, "room registry error");
        Self::from_kind(ErrorKind::Internal, error.to_string())
    }
}
