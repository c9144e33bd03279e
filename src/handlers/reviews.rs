use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ModeratorClaims, ReviewCreated, TransportError, UploadedFile};
use crate::services::gallery::GalleryResponse;
use crate::services::upload::SubmitOutcome;
use crate::utils::nonce;

#[derive(Serialize, ToSchema)]
pub struct SubmitImagesResponse {
    /// Number of images attached. Zero covers both skips and silent
    /// per-file failures; the submitter is never told which.
    pub attached: usize,
}

/// Subscriber endpoint for the "review created" event. The multipart body
/// is normalized exactly once into typed descriptors, in upload order.
#[utoipa::path(
    post,
    path = "/reviews/{id}/images",
    params(
        ("id" = String, Path, description = "Review ID")
    ),
    request_body(content = Multipart, description = "subject_id, guest flag, and 0..N image fields"),
    responses(
        (status = 200, description = "Submission processed", body = SubmitImagesResponse),
        (status = 400, description = "Malformed multipart body")
    )
)]
pub async fn submit_review_images(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SubmitImagesResponse>, AppError> {
    let mut subject_id = String::new();
    let mut is_logged_in = true;
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "subject_id" => {
                subject_id = field.text().await.unwrap_or_default();
            }
            "guest" => {
                let text = field.text().await.unwrap_or_default();
                is_logged_in = !(text == "1" || text.eq_ignore_ascii_case("true"));
            }
            "image" => {
                // Entries with an empty filename are dropped here, the
                // normalization step of the workflow contract.
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    continue;
                }
                let declared_mime = field.content_type().map(|s| s.to_string());

                match field.bytes().await {
                    Ok(bytes) => files.push(UploadedFile {
                        name: filename,
                        declared_mime,
                        data: bytes.to_vec(),
                        transport_error: None,
                    }),
                    Err(e) => {
                        tracing::debug!("Transport failure reading '{}': {}", filename, e);
                        files.push(UploadedFile {
                            name: filename,
                            declared_mime,
                            data: Vec::new(),
                            transport_error: Some(TransportError::Failed),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    let settings = state.options.review_settings().await?;
    let event = ReviewCreated {
        review_id,
        subject_id,
        is_logged_in,
        files,
    };

    let outcome = state.uploads.submit_review_images(event, &settings).await?;
    let attached = match outcome {
        SubmitOutcome::Attached(attachment) => attachment.attachment_ids.len(),
        SubmitOutcome::Skipped(_) => 0,
    };

    Ok(Json(SubmitImagesResponse { attached }))
}

#[utoipa::path(
    get,
    path = "/reviews/{id}/images",
    params(
        ("id" = String, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Publicly visible images", body = GalleryResponse)
    )
)]
pub async fn review_images(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<GalleryResponse>, AppError> {
    let settings = state.options.review_settings().await?;
    let gallery = state.gallery.gallery(&review_id, &settings).await?;
    Ok(Json(gallery))
}

#[derive(Serialize, ToSchema)]
pub struct NonceResponse {
    pub nonce: String,
}

#[utoipa::path(
    get,
    path = "/moderation/nonce/{id}",
    params(
        ("id" = String, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Nonce for the moderation form", body = NonceResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("moderator_token" = [])
    )
)]
pub async fn moderation_nonce(
    State(state): State<AppState>,
    Extension(_claims): Extension<ModeratorClaims>,
    Path(review_id): Path<String>,
) -> Json<NonceResponse> {
    let nonce = nonce::issue(&state.config.nonce_secret, &review_id, nonce::now_unix());
    Json(NonceResponse { nonce })
}

#[derive(Deserialize, ToSchema)]
pub struct ModerationForm {
    pub approved: bool,
    #[serde(default)]
    pub delete: Vec<String>,
    pub nonce: String,
}

#[derive(Serialize, ToSchema)]
pub struct ModerationResponse {
    pub remaining: usize,
}

/// Combined moderation form: approval flag plus deletions, applied as two
/// sequential idempotent writes.
#[utoipa::path(
    post,
    path = "/moderation/reviews/{id}/images",
    params(
        ("id" = String, Path, description = "Review ID")
    ),
    request_body = ModerationForm,
    responses(
        (status = 200, description = "Moderation applied", body = ModerationResponse),
        (status = 400, description = "Invalid nonce"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("moderator_token" = [])
    )
)]
pub async fn moderate_review_images(
    State(state): State<AppState>,
    Extension(claims): Extension<ModeratorClaims>,
    Path(review_id): Path<String>,
    Json(form): Json<ModerationForm>,
) -> Result<Json<ModerationResponse>, AppError> {
    if !nonce::verify(
        &state.config.nonce_secret,
        &review_id,
        &form.nonce,
        nonce::now_unix(),
    ) {
        return Err(AppError::BadRequest("Invalid or expired nonce".to_string()));
    }

    state
        .moderation
        .approve(&claims, &review_id, form.approved)
        .await?;

    let to_remove: HashSet<String> = form.delete.into_iter().collect();
    state
        .moderation
        .remove_images(&claims, &review_id, &to_remove)
        .await?;

    let remaining = crate::services::attachments::load(&state.db, &review_id)
        .await?
        .map(|record| record.attachment_ids.len())
        .unwrap_or(0);

    Ok(Json(ModerationResponse { remaining }))
}
