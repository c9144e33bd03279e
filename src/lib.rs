pub mod api;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::gallery::GalleryService;
use crate::services::media::MediaStore;
use crate::services::moderation::ModerationService;
use crate::services::options::OptionStore;
use crate::services::upload::UploadWorkflow;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::reviews::submit_review_images,
        handlers::reviews::review_images,
        handlers::reviews::moderation_nonce,
        handlers::reviews::moderate_review_images,
        handlers::settings::get_settings,
        handlers::settings::save_settings,
        handlers::settings::get_discussion_settings,
        handlers::settings::save_discussion_settings,
        handlers::settings::theme_css,
        handlers::media::serve_media,
    ),
    components(
        schemas(
            handlers::reviews::SubmitImagesResponse,
            handlers::reviews::NonceResponse,
            handlers::reviews::ModerationForm,
            handlers::reviews::ModerationResponse,
            services::gallery::GalleryItem,
            services::gallery::GalleryResponse,
            models::ReviewSettings,
            models::Palette,
            models::DiscussionSettings,
            models::CommentOrder,
            models::ApprovalStatus,
            models::VisibleImage,
        )
    ),
    tags(
        (name = "reviews", description = "Review image submission and rendering"),
        (name = "moderation", description = "Operator moderation of review images"),
        (name = "settings", description = "Review settings and theming")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub media: Arc<dyn MediaStore>,
    pub options: OptionStore,
    pub uploads: Arc<UploadWorkflow>,
    pub moderation: Arc<ModerationService>,
    pub gallery: Arc<GalleryService>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>, config: ServerConfig) -> Self {
        Self {
            options: OptionStore::new(db.clone()),
            uploads: Arc::new(UploadWorkflow::new(db.clone(), media.clone())),
            moderation: Arc::new(ModerationService::new(db.clone(), media.clone())),
            gallery: Arc::new(GalleryService::new(db.clone(), media.clone())),
            db,
            media,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let moderate = from_fn_with_state(state.clone(), middleware::auth::moderator_middleware);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/reviews/:id/images",
            post(handlers::reviews::submit_review_images)
                .get(handlers::reviews::review_images),
        )
        .route(
            "/moderation/nonce/:id",
            get(handlers::reviews::moderation_nonce).layer(moderate.clone()),
        )
        .route(
            "/moderation/reviews/:id/images",
            post(handlers::reviews::moderate_review_images).layer(moderate.clone()),
        )
        .route(
            "/settings",
            put(handlers::settings::save_settings)
                .layer(moderate.clone())
                .get(handlers::settings::get_settings),
        )
        .route(
            "/settings/discussion",
            put(handlers::settings::save_discussion_settings)
                .layer(moderate)
                .get(handlers::settings::get_discussion_settings),
        )
        .route(
            "/assets/review-theme.css",
            get(handlers::settings::theme_css),
        )
        .route("/media/:variant/:id", get(handlers::media::serve_media))
        .with_state(state)
}
