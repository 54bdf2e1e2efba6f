//! Listing routes

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartRejection, rejection::PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{ListingDetail, ListingFields, ListingForm, NewListing},
    repositories::ListingRepository,
    state::AppState,
    uploads::StagedFile,
    validation::validate_listing,
};

/// Attachment part held in memory until the form is validated
struct Attachment {
    filename: String,
    bytes: Bytes,
}

/// Multipart listing submission
#[derive(Default)]
struct ListingSubmission {
    form: ListingForm,
    images: Vec<Attachment>,
    video: Option<Attachment>,
}

async fn read_submission(mut multipart: Multipart) -> ApiResult<ListingSubmission> {
    let mut submission = ListingSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "images" | "video" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;

                // Browsers send an empty part when no file was picked
                if filename.is_empty() {
                    continue;
                }

                let attachment = Attachment { filename, bytes };
                if name == "images" {
                    submission.images.push(attachment);
                } else if submission.video.replace(attachment).is_some() {
                    return Err(ApiError::Validation(
                        "Only one video can be attached to a listing".to_string(),
                    ));
                }
            }
            "title" => submission.form.title = Some(field.text().await?),
            "description" => submission.form.description = Some(field.text().await?),
            "price" => submission.form.price = Some(field.text().await?),
            "is_rental" => submission.form.is_rental = Some(field.text().await?),
            "rental_duration" => submission.form.rental_duration = Some(field.text().await?),
            "category" => submission.form.category = Some(field.text().await?),
            _ => debug!("Ignoring unknown listing field {:?}", name),
        }
    }

    Ok(submission)
}

/// Stage attachments, insert the row and promote the files in one transaction
///
/// Every file staged along the way is recorded in `staged`, so the caller can
/// discard them when this fails.
async fn persist_listing(
    state: &AppState,
    seller_id: i64,
    fields: ListingFields,
    submission: &ListingSubmission,
    staged: &mut Vec<StagedFile>,
) -> ApiResult<ListingDetail> {
    let mut images = Vec::with_capacity(submission.images.len());
    for attachment in &submission.images {
        if let Some(file) = state
            .uploads
            .stage(seller_id, &attachment.filename, &attachment.bytes)
            .await?
        {
            images.push(file.stored_name.clone());
            staged.push(file);
        }
    }

    let mut video = None;
    if let Some(attachment) = &submission.video {
        if let Some(file) = state
            .uploads
            .stage(seller_id, &attachment.filename, &attachment.bytes)
            .await?
        {
            video = Some(file.stored_name.clone());
            staged.push(file);
        }
    }

    let listing = NewListing {
        fields,
        images,
        video,
        seller_id,
    };

    let mut tx = state.db_pool.begin().await?;
    let id = ListingRepository::insert(&mut tx, &listing).await?;
    let detail = ListingRepository::fetch_detail(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Listing {} vanished after insert", id)))?;

    state.uploads.promote(staged).await?;
    tx.commit().await?;

    Ok(detail)
}

/// Create a listing from a multipart form
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let multipart = multipart.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let submission = read_submission(multipart).await?;
    let fields = validate_listing(&submission.form).map_err(ApiError::Validation)?;

    // Runs detached so a dropped connection cannot stop it between staging and commit
    let detail = tokio::spawn(async move {
        let mut staged = Vec::new();
        match persist_listing(&state, current.id, fields, &submission, &mut staged).await {
            Ok(detail) => {
                info!(
                    "User {} created listing {} with {} attachment(s)",
                    current.username,
                    detail.id,
                    staged.len()
                );
                Ok(detail)
            }
            Err(err) => {
                state.uploads.discard(&staged).await;
                Err(err)
            }
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Listing creation task failed: {}", e)))??;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get all listings
pub async fn list_listings(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let listings = state.listing_repository.list_all().await?;
    Ok(Json(listings))
}

/// Get a listing by ID
pub async fn get_listing(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let not_found = || ApiError::NotFound("Listing not found".to_string());

    let Path(id) = id.map_err(|_| not_found())?;
    let listing = state
        .listing_repository
        .find_detail(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(listing))
}
