use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::SizeVariant;
use crate::utils::validation::sanitize_subdir;

/// A file handed to the media store for ingestion.
pub struct IngestFile<'a> {
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

/// A stored file resolved for serving.
pub struct ResolvedFile {
    pub abs_path: PathBuf,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

/// Host media pipeline: ingests validated uploads, resolves size-variant
/// URLs, deletes by identifier. Attachment ids are opaque to callers.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persists a file under the given subdirectory and returns its
    /// attachment id. The caller has already validated type and size;
    /// the store still refuses MIME types outside `allowed_types`.
    async fn ingest(
        &self,
        file: IngestFile<'_>,
        owner_subject_id: &str,
        subdir: &str,
        allowed_types: &[&str],
    ) -> Result<String>;

    /// Resolves a public URL for one rendition of an attachment. Fails when
    /// the attachment is unknown or its file is gone.
    async fn resolve(&self, attachment_id: &str, variant: SizeVariant) -> Result<String>;

    /// Resolves the stored file itself for serving.
    async fn open(&self, attachment_id: &str) -> Result<ResolvedFile>;

    /// Permanently deletes an attachment. With `cascade`, derived renditions
    /// go with it.
    async fn delete(&self, attachment_id: &str, cascade: bool) -> Result<()>;
}

/// Media store backed by the local filesystem plus a SQLite index.
/// Files live at `{root}/{subdir}/{uuid}.{ext}`; both renditions of an
/// attachment resolve to the same stored file behind variant URLs, since
/// resizing is the host pipeline's business, not ours.
pub struct LocalMediaStore {
    db: SqlitePool,
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(db: SqlitePool, root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            db,
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, attachment_id: &str) -> Result<(String, String, i64, DateTime<Utc>)> {
        let row: Option<(String, String, i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT rel_path, mime_type, size, created_at FROM media_attachments WHERE id = ?",
        )
        .bind(attachment_id)
        .fetch_optional(&self.db)
        .await?;

        row.ok_or_else(|| anyhow!("unknown attachment: {}", attachment_id))
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn ingest(
        &self,
        file: IngestFile<'_>,
        owner_subject_id: &str,
        subdir: &str,
        allowed_types: &[&str],
    ) -> Result<String> {
        if !allowed_types.contains(&file.mime_type) {
            return Err(anyhow!("MIME type '{}' is not allowed", file.mime_type));
        }

        let subdir = sanitize_subdir(subdir);
        let id = Uuid::new_v4().to_string();
        let rel_path = format!("{}/{}.{}", subdir, id, extension_for(file.mime_type));

        let abs_path = self.root.join(&rel_path);
        if let Some(parent) = abs_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&abs_path, file.data).await?;

        let insert = sqlx::query(
            "INSERT INTO media_attachments (id, rel_path, mime_type, size, owner_subject_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&rel_path)
        .bind(file.mime_type)
        .bind(file.data.len() as i64)
        .bind(owner_subject_id)
        .execute(&self.db)
        .await;

        if let Err(e) = insert {
            // Do not leave an orphan file behind a failed index write.
            let _ = tokio::fs::remove_file(&abs_path).await;
            return Err(e.into());
        }

        tracing::debug!(
            "Ingested {} ({} bytes) as attachment {}",
            file.filename,
            file.data.len(),
            id
        );
        Ok(id)
    }

    async fn resolve(&self, attachment_id: &str, variant: SizeVariant) -> Result<String> {
        let (rel_path, _, _, _) = self.lookup(attachment_id).await?;

        let abs_path = self.root.join(&rel_path);
        if !tokio::fs::try_exists(&abs_path).await.unwrap_or(false) {
            return Err(anyhow!("attachment file missing: {}", attachment_id));
        }

        Ok(format!(
            "{}/media/{}/{}",
            self.public_base_url,
            variant.as_str(),
            attachment_id
        ))
    }

    async fn open(&self, attachment_id: &str) -> Result<ResolvedFile> {
        let (rel_path, mime_type, size, created_at) = self.lookup(attachment_id).await?;
        let abs_path = self.root.join(&rel_path);
        if !tokio::fs::try_exists(&abs_path).await.unwrap_or(false) {
            return Err(anyhow!("attachment file missing: {}", attachment_id));
        }
        Ok(ResolvedFile {
            abs_path,
            mime_type,
            size,
            created_at,
        })
    }

    async fn delete(&self, attachment_id: &str, _cascade: bool) -> Result<()> {
        let (rel_path, _, _, _) = self.lookup(attachment_id).await?;

        // Row first, then file. A missing file is not an error on delete.
        sqlx::query("DELETE FROM media_attachments WHERE id = ?")
            .bind(attachment_id)
            .execute(&self.db)
            .await?;

        let abs_path = self.root.join(&rel_path);
        if let Err(e) = tokio::fs::remove_file(&abs_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", abs_path.display(), e);
            }
        }

        tracing::debug!("Deleted attachment {}", attachment_id);
        Ok(())
    }
}
