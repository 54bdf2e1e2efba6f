//! Middleware for session authentication and request size limits

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState, uploads::MAX_REQUEST_BYTES};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Authenticated user attached to protected requests
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub session_id: Uuid,
}

/// Session token from the cookie, else from an `Authorization: Bearer` header
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolve the session and attach the current user to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&jar, req.headers()).ok_or(ApiError::Unauthenticated)?;
    let (user, session) = state.sessions.resolve(&token).await?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
        session_id: session.id,
    });

    Ok(next.run(req).await)
}

/// True when the declared body length is above `limit`
pub fn exceeds_limit(headers: &HeaderMap, limit: usize) -> bool {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .is_some_and(|length| length > limit as u64)
}

/// Reject requests whose declared length is above the upload ceiling before reading them
pub async fn limit_request_size(req: Request<Body>, next: Next) -> Response {
    if exceeds_limit(req.headers(), MAX_REQUEST_BYTES) {
        warn!(
            "Rejected {} {} with oversized body",
            req.method(),
            req.uri().path()
        );
        return ApiError::PayloadTooLarge.into_response();
    }

    next.run(req).await
}
