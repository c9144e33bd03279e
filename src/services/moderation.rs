use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::Capabilities;
use crate::services::attachments;
use crate::services::media::MediaStore;

/// Operator actions on a review's image batch. Every entry point delegates
/// the capability check and fails closed: a caller without the moderate
/// capability gets a silent no-op, not an error.
pub struct ModerationService {
    db: SqlitePool,
    media: Arc<dyn MediaStore>,
}

impl ModerationService {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>) -> Self {
        Self { db, media }
    }

    /// Sets the batch approval flag. Idempotent.
    pub async fn approve(
        &self,
        caps: &dyn Capabilities,
        review_id: &str,
        approved: bool,
    ) -> Result<()> {
        if !caps.can_moderate() {
            tracing::warn!(
                "Denied approval change for review {} (missing moderate capability)",
                review_id
            );
            return Ok(());
        }

        attachments::set_approved(&self.db, review_id, approved).await?;
        tracing::info!(
            "Review {}: images {}",
            review_id,
            if approved { "approved" } else { "set pending" }
        );
        Ok(())
    }

    /// Permanently deletes the listed attachments from the review's batch,
    /// cascading to derived renditions. Survivors keep their relative
    /// order; removing the last one removes the record itself.
    pub async fn remove_images(
        &self,
        caps: &dyn Capabilities,
        review_id: &str,
        to_remove: &HashSet<String>,
    ) -> Result<()> {
        if !caps.can_moderate() {
            tracing::warn!(
                "Denied image removal for review {} (missing moderate capability)",
                review_id
            );
            return Ok(());
        }
        if to_remove.is_empty() {
            return Ok(());
        }

        let Some(record) = attachments::load(&self.db, review_id).await? else {
            return Ok(());
        };

        let mut survivors = Vec::with_capacity(record.attachment_ids.len());
        for id in record.attachment_ids {
            if to_remove.contains(&id) {
                // Deletion intent is final; a media-store failure is logged
                // and the id still leaves the stored sequence.
                if let Err(e) = self.media.delete(&id, true).await {
                    tracing::warn!(
                        "Review {}: failed to delete attachment {}: {}",
                        review_id,
                        id,
                        e
                    );
                }
            } else {
                survivors.push(id);
            }
        }

        if survivors.is_empty() {
            attachments::delete(&self.db, review_id).await?;
            tracing::info!("Review {}: all images removed, record deleted", review_id);
        } else {
            attachments::set_attachment_ids(&self.db, review_id, &survivors).await?;
            tracing::info!(
                "Review {}: {} image(s) remain after removal",
                review_id,
                survivors.len()
            );
        }
        Ok(())
    }
}
