//! Marketplace HTTP routes

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{auth_middleware, limit_request_size},
    state::AppState,
    uploads::MAX_REQUEST_BYTES,
};

pub mod auth;
pub mod listings;
pub mod messages;
pub mod uploads;

/// CORS policy for the single configured web client origin
pub fn build_cors(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = origin
        .trim()
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {:?}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

/// Create the router for the marketplace service
pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let cors = build_cors(&state.config.cors_origin)?;

    let protected_routes = Router::new()
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/api/listings", post(listings::create_listing))
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/listings", get(listings::list_listings))
        .route("/api/listings/:id", get(listings::get_listing))
        .route("/api/uploads/:filename", get(uploads::get_upload));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(middleware::from_fn(limit_request_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if !common::database::health_check(&state.db_pool).await? {
        return Err(ApiError::Internal("Database health check failed".to_string()));
    }

    Ok(Json(json!({
        "status": "ok",
        "service": "marketplace"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origin_must_be_a_header_value() {
        assert!(build_cors("http://localhost:3000").is_ok());
        assert!(build_cors("http://bad\norigin").is_err());
    }
}
