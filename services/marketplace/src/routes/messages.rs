//! Messaging routes

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::SendMessageRequest,
    repositories::{ListingRepository, MessageRepository, UserRepository},
    state::AppState,
};

fn missing(field: &str) -> ApiError {
    ApiError::Validation(format!("Missing required field: {}", field))
}

/// Send a message about a listing
pub async fn send_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let receiver_id = payload.receiver_id.ok_or_else(|| missing("receiver_id"))?;
    let listing_id = payload.listing_id.ok_or_else(|| missing("listing_id"))?;
    let content = payload
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| missing("content"))?;

    let mut tx = state.db_pool.begin().await?;

    if !UserRepository::exists(&mut tx, receiver_id).await? {
        return Err(ApiError::Validation(format!(
            "Receiver {} does not exist",
            receiver_id
        )));
    }

    if !ListingRepository::exists(&mut tx, listing_id).await? {
        return Err(ApiError::Validation(format!(
            "Listing {} does not exist",
            listing_id
        )));
    }

    let message =
        MessageRepository::insert(&mut tx, current.id, receiver_id, listing_id, &content).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Messages the current user sent or received, newest first
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.message_repository.list_for_user(current.id).await?;
    Ok(Json(messages))
}
