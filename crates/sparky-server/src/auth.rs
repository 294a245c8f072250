//! Bearer authentication middleware.
//!
//! Validates the `Authorization: Bearer <token>` header and injects the
//! resolved [`AuthenticatedCaller`] into the request extensions, where the
//! [`Caller`] extractor picks it up.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sparky_auth::AuthenticatedCaller;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller of a protected route.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthenticatedCaller);

/// Rejects requests without a valid bearer token.
pub async fn require_bearer(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = extract_bearer_token(&request) else {
        return ApiError::Unauthorized("missing or invalid Authorization header".to_string())
            .into_response();
    };

    match state.login.authenticate_bearer(&token) {
        Ok(caller) => {
            tracing::debug!(caller = %caller.actor(), "Bearer token accepted");
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "Bearer token rejected");
            ApiError::from(err).into_response()
        }
    }
}

/// Extracts the bearer token from the request.
fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedCaller>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| ApiError::Unauthorized("not authenticated".to_string()))
    }
}
