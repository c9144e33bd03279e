use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::{
    ApprovalStatus, ReviewCreated, ReviewImageAttachment, ReviewSettings, TransportError,
};
use crate::services::attachments;
use crate::services::media::{IngestFile, MediaStore};
use crate::utils::validation::{
    ALLOWED_IMAGE_MIMES, MAX_BATCH_BYTES, MAX_IMAGE_BYTES, MAX_IMAGES_PER_REVIEW, sniff_image_type,
};

/// Why a submission produced no attachment record. None of these surface to
/// the submitter; the review itself stands either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFiles,
    ImagesDisabled,
    GuestsNotAllowed,
    SubjectNotReviewable,
    NothingAccepted,
    DuplicateEvent,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Attached(ReviewImageAttachment),
    Skipped(SkipReason),
}

/// Validates, bounds, and stores the image batch attached to a newly
/// created review.
pub struct UploadWorkflow {
    db: SqlitePool,
    media: Arc<dyn MediaStore>,
}

impl UploadWorkflow {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>) -> Self {
        Self { db, media }
    }

    /// Subscriber to the "review created" event. Every per-file failure is
    /// a silent skip; the worst case is a review with no images even though
    /// files were submitted.
    pub async fn submit_review_images(
        &self,
        event: ReviewCreated,
        settings: &ReviewSettings,
    ) -> Result<SubmitOutcome> {
        if event.files.is_empty() {
            return Ok(SubmitOutcome::Skipped(SkipReason::NoFiles));
        }
        if !self.subject_is_reviewable(&event.subject_id).await? {
            tracing::debug!(
                "Review {}: subject {} is not reviewable, skipping images",
                event.review_id,
                event.subject_id
            );
            return Ok(SubmitOutcome::Skipped(SkipReason::SubjectNotReviewable));
        }
        if !settings.allow_images {
            return Ok(SubmitOutcome::Skipped(SkipReason::ImagesDisabled));
        }
        if !event.is_logged_in && !settings.allow_images_guests {
            tracing::debug!(
                "Review {}: guest images disabled, skipping",
                event.review_id
            );
            return Ok(SubmitOutcome::Skipped(SkipReason::GuestsNotAllowed));
        }
        // The workflow runs once per review-created event. Bail on a
        // duplicate before ingesting files the record would never reference.
        if attachments::load(&self.db, &event.review_id).await?.is_some() {
            tracing::warn!(
                "Review {} already has an attachment record, ignoring duplicate submit",
                event.review_id
            );
            return Ok(SubmitOutcome::Skipped(SkipReason::DuplicateEvent));
        }

        let mut accepted: Vec<String> = Vec::new();
        let mut total_accepted: usize = 0;

        // Upload order is display order. Entries without a name were
        // already dropped at the boundary, but guard here too.
        for file in event.files.iter().filter(|f| !f.name.is_empty()) {
            if accepted.len() == MAX_IMAGES_PER_REVIEW {
                break;
            }

            match file.transport_error {
                Some(TransportError::NoFile) => continue,
                Some(TransportError::Failed) => {
                    tracing::debug!(
                        "Review {}: transport failure for '{}', skipping file",
                        event.review_id,
                        file.name
                    );
                    continue;
                }
                None => {}
            }

            if file.size() == 0 {
                continue;
            }

            if file.size() > MAX_IMAGE_BYTES {
                tracing::debug!(
                    "Review {}: '{}' over single-file cap, skipping",
                    event.review_id,
                    file.name
                );
                continue;
            }

            // Total-budget cutoff: the file that pushes the running total
            // over the line ends the batch entirely. Already-accepted files
            // are kept. The total counts every size-checked file, whether
            // or not it goes on to pass sniffing.
            total_accepted += file.size();
            if total_accepted > MAX_BATCH_BYTES {
                tracing::debug!(
                    "Review {}: batch budget exceeded at '{}', truncating",
                    event.review_id,
                    file.name
                );
                break;
            }

            let mime =
                match sniff_image_type(&file.name, file.declared_mime.as_deref(), &file.data) {
                    Ok(mime) => mime,
                    Err(rejection) => {
                        tracing::debug!(
                            "Review {}: '{}' rejected ({}), skipping",
                            event.review_id,
                            file.name,
                            rejection
                        );
                        continue;
                    }
                };

            let ingest = IngestFile {
                filename: &file.name,
                mime_type: mime,
                data: &file.data,
            };
            match self
                .media
                .ingest(
                    ingest,
                    &event.subject_id,
                    &settings.images_subdir,
                    ALLOWED_IMAGE_MIMES,
                )
                .await
            {
                Ok(attachment_id) => accepted.push(attachment_id),
                Err(e) => {
                    tracing::warn!(
                        "Review {}: media ingestion failed for '{}': {}",
                        event.review_id,
                        file.name,
                        e
                    );
                }
            }
        }

        if accepted.is_empty() {
            return Ok(SubmitOutcome::Skipped(SkipReason::NothingAccepted));
        }

        // Approval is frozen at creation from the flag as it stands now;
        // later config flips only affect the read path.
        let status = if settings.require_image_approval {
            ApprovalStatus::Pending
        } else {
            ApprovalStatus::Approved
        };

        let attachment = ReviewImageAttachment {
            review_id: event.review_id.clone(),
            attachment_ids: accepted,
            approval_status: status,
        };
        // A conflicting row here means we lost a race against a concurrent
        // duplicate event. The existing record stands; the files just
        // ingested belong to nothing, so take them back out.
        if !attachments::create(&self.db, &attachment).await? {
            tracing::warn!(
                "Review {} already has an attachment record, discarding duplicate batch",
                attachment.review_id
            );
            for id in &attachment.attachment_ids {
                if let Err(e) = self.media.delete(id, true).await {
                    tracing::warn!(
                        "Review {}: failed to discard attachment {}: {}",
                        attachment.review_id,
                        id,
                        e
                    );
                }
            }
            return Ok(SubmitOutcome::Skipped(SkipReason::DuplicateEvent));
        }

        tracing::info!(
            "Review {}: attached {} image(s), status {:?}",
            attachment.review_id,
            attachment.attachment_ids.len(),
            attachment.approval_status
        );
        Ok(SubmitOutcome::Attached(attachment))
    }

    async fn subject_is_reviewable(&self, subject_id: &str) -> Result<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT kind FROM products WHERE id = ?")
            .bind(subject_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some_and(|(kind,)| kind == "product"))
    }
}
