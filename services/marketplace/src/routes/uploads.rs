//! Upload retrieval route

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    uploads::content_type,
};

/// Serve a stored attachment
pub async fn get_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let bytes = state
        .uploads
        .retrieve(&filename)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, content_type(&filename))], bytes))
}
