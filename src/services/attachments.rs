use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::{ApprovalStatus, ReviewImageAttachment};

/// Row access for `review_image_attachments`, shared by the upload,
/// moderation, and gallery services.
pub async fn load(db: &SqlitePool, review_id: &str) -> Result<Option<ReviewImageAttachment>> {
    let row: Option<(String, bool)> = sqlx::query_as(
        "SELECT attachment_ids, approved FROM review_image_attachments WHERE review_id = ?",
    )
    .bind(review_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some((ids, approved)) => Ok(Some(ReviewImageAttachment {
            review_id: review_id.to_string(),
            attachment_ids: serde_json::from_str(&ids)?,
            approval_status: if approved {
                ApprovalStatus::Approved
            } else {
                ApprovalStatus::Pending
            },
        })),
        None => Ok(None),
    }
}

/// Creates the record for a review. Idempotent: a conflicting row is left
/// untouched and reported via the return value.
pub async fn create(db: &SqlitePool, attachment: &ReviewImageAttachment) -> Result<bool> {
    let ids = serde_json::to_string(&attachment.attachment_ids)?;
    let approved = attachment.approval_status == ApprovalStatus::Approved;

    let result = sqlx::query(
        "INSERT INTO review_image_attachments (review_id, attachment_ids, approved) \
         VALUES (?, ?, ?) ON CONFLICT(review_id) DO NOTHING",
    )
    .bind(&attachment.review_id)
    .bind(ids)
    .bind(approved)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_approved(db: &SqlitePool, review_id: &str, approved: bool) -> Result<()> {
    sqlx::query("UPDATE review_image_attachments SET approved = ? WHERE review_id = ?")
        .bind(approved)
        .bind(review_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_attachment_ids(db: &SqlitePool, review_id: &str, ids: &[String]) -> Result<()> {
    let json = serde_json::to_string(ids)?;
    sqlx::query("UPDATE review_image_attachments SET attachment_ids = ? WHERE review_id = ?")
        .bind(json)
        .bind(review_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, review_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM review_image_attachments WHERE review_id = ?")
        .bind(review_id)
        .execute(db)
        .await?;
    Ok(())
}
