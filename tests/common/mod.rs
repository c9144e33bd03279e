use anyhow::{Result, anyhow};
use async_trait::async_trait;
use review_image_backend::models::{SizeVariant, UploadedFile};
use review_image_backend::services::media::{IngestFile, MediaStore, ResolvedFile};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

pub const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// PNG-sniffing bytes padded to the requested length.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = PNG_MAGIC.to_vec();
    data.resize(len.max(PNG_MAGIC.len()), 0);
    data
}

pub fn png_file(name: &str, len: usize) -> UploadedFile {
    UploadedFile {
        name: name.to_string(),
        declared_mime: Some("image/png".to_string()),
        data: png_bytes(len),
        transport_error: None,
    }
}

pub async fn setup_db() -> SqlitePool {
    // One connection: every handle must see the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub async fn insert_product(pool: &SqlitePool, id: &str) {
    sqlx::query("INSERT INTO products (id, kind, name) VALUES (?, 'product', 'Widget')")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}

/// In-memory media store double. Counts ingestion calls so tests can assert
/// that gated submissions never reach the media pipeline.
#[derive(Default)]
pub struct MemoryMediaStore {
    pub files: Mutex<HashMap<String, (String, usize)>>,
    pub ingest_calls: AtomicUsize,
}

impl MemoryMediaStore {
    pub fn ingest_count(&self) -> usize {
        self.ingest_calls.load(Ordering::SeqCst)
    }

    pub fn forget(&self, attachment_id: &str) {
        self.files.lock().unwrap().remove(attachment_id);
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn ingest(
        &self,
        file: IngestFile<'_>,
        _owner_subject_id: &str,
        _subdir: &str,
        allowed_types: &[&str],
    ) -> Result<String> {
        self.ingest_calls.fetch_add(1, Ordering::SeqCst);
        if !allowed_types.contains(&file.mime_type) {
            return Err(anyhow!("MIME type '{}' is not allowed", file.mime_type));
        }
        let id = Uuid::new_v4().to_string();
        self.files
            .lock()
            .unwrap()
            .insert(id.clone(), (file.mime_type.to_string(), file.data.len()));
        Ok(id)
    }

    async fn resolve(&self, attachment_id: &str, variant: SizeVariant) -> Result<String> {
        if !self.files.lock().unwrap().contains_key(attachment_id) {
            return Err(anyhow!("unknown attachment: {}", attachment_id));
        }
        Ok(format!(
            "http://test/media/{}/{}",
            variant.as_str(),
            attachment_id
        ))
    }

    async fn open(&self, attachment_id: &str) -> Result<ResolvedFile> {
        Err(anyhow!("not served in memory: {}", attachment_id))
    }

    async fn delete(&self, attachment_id: &str, _cascade: bool) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(attachment_id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("unknown attachment: {}", attachment_id))
    }
}
