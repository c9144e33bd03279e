use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::models::{ApprovalStatus, ReviewSettings, SizeVariant, VisibleImage};
use crate::services::attachments;
use crate::services::media::MediaStore;

/// One gallery entry with the client-local lightbox navigation metadata:
/// positions wrap cyclically from last back to first.
#[derive(Debug, Serialize, ToSchema)]
pub struct GalleryItem {
    pub id: String,
    pub thumbnail_url: String,
    pub full_url: String,
    pub position: usize,
    pub prev: usize,
    pub next: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GalleryResponse {
    pub review_id: String,
    pub count: usize,
    pub items: Vec<GalleryItem>,
}

/// Read side of the review-image workflow: resolves the images the public
/// may currently see.
pub struct GalleryService {
    db: SqlitePool,
    media: Arc<dyn MediaStore>,
}

impl GalleryService {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>) -> Self {
        Self { db, media }
    }

    /// Visibility is re-derived from the live config on every call: a
    /// pending batch is hidden only while approval is currently required.
    /// Identifiers that no longer resolve are skipped silently.
    pub async fn visible_images(
        &self,
        review_id: &str,
        settings: &ReviewSettings,
    ) -> Result<Vec<VisibleImage>> {
        let Some(record) = attachments::load(&self.db, review_id).await? else {
            return Ok(Vec::new());
        };

        if settings.require_image_approval
            && record.approval_status != ApprovalStatus::Approved
        {
            return Ok(Vec::new());
        }

        let mut images = Vec::with_capacity(record.attachment_ids.len());
        for id in record.attachment_ids {
            let thumbnail = self.media.resolve(&id, SizeVariant::Thumbnail).await;
            let full = self.media.resolve(&id, SizeVariant::Full).await;
            match (thumbnail, full) {
                (Ok(thumbnail_url), Ok(full_url)) => images.push(VisibleImage {
                    id,
                    thumbnail_url,
                    full_url,
                }),
                _ => {
                    tracing::debug!(
                        "Review {}: attachment {} no longer resolves, skipping",
                        review_id,
                        id
                    );
                }
            }
        }
        Ok(images)
    }

    /// Gallery payload for the review listing hook.
    pub async fn gallery(
        &self,
        review_id: &str,
        settings: &ReviewSettings,
    ) -> Result<GalleryResponse> {
        let images = self.visible_images(review_id, settings).await?;
        let count = images.len();

        let items = images
            .into_iter()
            .enumerate()
            .map(|(position, image)| GalleryItem {
                id: image.id,
                thumbnail_url: image.thumbnail_url,
                full_url: image.full_url,
                position,
                prev: if position == 0 { count - 1 } else { position - 1 },
                next: if position + 1 == count { 0 } else { position + 1 },
            })
            .collect();

        Ok(GalleryResponse {
            review_id: review_id.to_string(),
            count,
            items,
        })
    }
}
