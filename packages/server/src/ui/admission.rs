//! Rate-limit admission middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::infrastructure::rate_limiter::TokenBucket;

use super::error::ApiError;

/// Reject the call with 429 when the shared bucket has no token left.
pub async fn admission_middleware(
    State(limiter): State<Arc<TokenBucket>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.allow() {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err(ApiError::too_many_requests("rate limit exceeded"));
    }
    Ok(next.run(request).await)
}
