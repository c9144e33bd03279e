use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::AppState;
use crate::api::error::AppError;
use crate::models::SizeVariant;

/// Streams a stored attachment rendition. Both variants currently serve
/// the same stored file; resizing belongs to the host media pipeline.
#[utoipa::path(
    get,
    path = "/media/{variant}/{id}",
    params(
        ("variant" = String, Path, description = "Size variant: thumbnail or full"),
        ("id" = String, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Image stream"),
        (status = 404, description = "Unknown variant or attachment")
    )
)]
pub async fn serve_media(
    State(state): State<AppState>,
    Path((variant, attachment_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let _variant = match variant.as_str() {
        "thumbnail" => SizeVariant::Thumbnail,
        "full" => SizeVariant::Full,
        _ => return Err(AppError::NotFound(format!("Unknown variant '{}'", variant))),
    };

    let resolved = state
        .media
        .open(&attachment_id)
        .await
        .map_err(|_| AppError::NotFound("Attachment not found".to_string()))?;

    let file = tokio::fs::File::open(&resolved.abs_path)
        .await
        .map_err(|_| AppError::NotFound("Attachment not found".to_string()))?;

    let body = Body::from_stream(ReaderStream::new(file));
    let headers = [
        (header::CONTENT_TYPE, resolved.mime_type),
        (header::CONTENT_LENGTH, resolved.size.to_string()),
        (
            header::LAST_MODIFIED,
            resolved
                .created_at
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
        ),
        (
            header::CACHE_CONTROL,
            "public, max-age=31536000, immutable".to_string(),
        ),
    ];

    Ok((headers, body).into_response())
}
