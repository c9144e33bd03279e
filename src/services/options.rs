use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::models::{DiscussionSettings, ReviewSettings};

const REVIEW_SETTINGS_KEY: &str = "review_images_settings";
const COMMENTS_PER_PAGE_KEY: &str = "comments_per_page";
const COMMENT_ORDER_KEY: &str = "comment_order";

/// Key-value option store over SQLite. Values are JSON; typed accessors
/// cover the composite review settings object and the two mirrored
/// host-level discussion keys.
#[derive(Clone)]
pub struct OptionStore {
    db: SqlitePool,
}

impl OptionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM options WHERE name = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some((value,)) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO options (name, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(name) DO UPDATE SET value = excluded.value, \
             updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(json)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Loads the review settings, falling back to defaults when none are
    /// stored. Called once per request that needs them.
    pub async fn review_settings(&self) -> Result<ReviewSettings> {
        Ok(self.get(REVIEW_SETTINGS_KEY).await?.unwrap_or_default())
    }

    pub async fn save_review_settings(&self, settings: &ReviewSettings) -> Result<()> {
        self.set(REVIEW_SETTINGS_KEY, settings).await
    }

    pub async fn discussion_settings(&self) -> Result<DiscussionSettings> {
        let defaults = DiscussionSettings::default();
        Ok(DiscussionSettings {
            comments_per_page: self
                .get(COMMENTS_PER_PAGE_KEY)
                .await?
                .unwrap_or(defaults.comments_per_page),
            comment_order: self
                .get(COMMENT_ORDER_KEY)
                .await?
                .unwrap_or(defaults.comment_order),
        })
    }

    pub async fn save_discussion_settings(&self, settings: &DiscussionSettings) -> Result<()> {
        self.set(COMMENTS_PER_PAGE_KEY, &settings.comments_per_page)
            .await?;
        self.set(COMMENT_ORDER_KEY, &settings.comment_order).await
    }

    /// Installs default settings if none are stored yet. Run at startup.
    pub async fn install_defaults(&self) -> Result<()> {
        if self.get::<ReviewSettings>(REVIEW_SETTINGS_KEY).await?.is_none() {
            tracing::info!("Installing default review settings");
            self.save_review_settings(&ReviewSettings::default()).await?;
        }
        Ok(())
    }
}
