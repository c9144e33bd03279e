use std::env;

use rand::RngCore;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite database URL (default: "sqlite://review-images.db")
    pub database_url: String,

    /// Root directory for stored review images (default: "./media")
    pub media_root: String,

    /// Public base URL used when resolving attachment URLs
    /// (default: "http://127.0.0.1:3000")
    pub public_base_url: String,

    /// Bearer token granting the moderate capability
    pub moderator_token: String,

    /// Secret used to sign moderation nonces
    pub nonce_secret: String,

    /// Maximum request body size in bytes (default: 8 MB, comfortably above
    /// the 3,774,873-byte batch budget plus multipart overhead)
    pub max_body_size: usize,

    /// Bind port (default: 3000)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://review-images.db".to_string(),
            media_root: "./media".to_string(),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            moderator_token: random_secret(),
            nonce_secret: random_secret(),
            max_body_size: 8 * 1024 * 1024,
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            media_root: env::var("MEDIA_ROOT").unwrap_or(default.media_root),

            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or(default.public_base_url),

            moderator_token: env::var("MODERATOR_TOKEN").unwrap_or(default.moderator_token),

            nonce_secret: env::var("NONCE_SECRET").unwrap_or(default.nonce_secret),

            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_body_size),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    /// Config for tests: fixed token and secret, caller supplies paths.
    pub fn test(media_root: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            media_root: media_root.to_string(),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            moderator_token: "test-moderator-token".to_string(),
            nonce_secret: "test-nonce-secret".to_string(),
            max_body_size: 8 * 1024 * 1024,
            port: 0,
        }
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
