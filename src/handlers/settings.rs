use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::AppState;
use crate::api::error::AppError;
use crate::models::{DiscussionSettings, ModeratorClaims, Palette, ReviewSettings};
use crate::utils::validation::{is_hex_color, sanitize_subdir};

#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Current review settings", body = ReviewSettings)
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<ReviewSettings>, AppError> {
    Ok(Json(state.options.review_settings().await?))
}

/// Validated save: every palette role must be `#rrggbb` and the storage
/// subdirectory is normalized to a single path-safe segment.
#[utoipa::path(
    put,
    path = "/settings",
    request_body = ReviewSettings,
    responses(
        (status = 200, description = "Settings saved", body = ReviewSettings),
        (status = 400, description = "Invalid color or subdirectory"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("moderator_token" = [])
    )
)]
pub async fn save_settings(
    State(state): State<AppState>,
    Extension(_claims): Extension<ModeratorClaims>,
    Json(mut settings): Json<ReviewSettings>,
) -> Result<Json<ReviewSettings>, AppError> {
    validate_palette(&settings.colors)?;
    settings.images_subdir = sanitize_subdir(&settings.images_subdir);

    state.options.save_review_settings(&settings).await?;
    tracing::info!("Review settings saved");
    Ok(Json(settings))
}

fn validate_palette(palette: &Palette) -> Result<(), AppError> {
    let roles = [
        ("primary", &palette.primary),
        ("background", &palette.background),
        ("border", &palette.border),
        ("text", &palette.text),
        ("accent", &palette.accent),
    ];
    for (role, value) in roles {
        if !is_hex_color(value) {
            return Err(AppError::BadRequest(format!(
                "Color '{}' must be a #rrggbb value, got '{}'",
                role, value
            )));
        }
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/settings/discussion",
    responses(
        (status = 200, description = "Mirrored discussion settings", body = DiscussionSettings)
    )
)]
pub async fn get_discussion_settings(
    State(state): State<AppState>,
) -> Result<Json<DiscussionSettings>, AppError> {
    Ok(Json(state.options.discussion_settings().await?))
}

#[utoipa::path(
    put,
    path = "/settings/discussion",
    request_body = DiscussionSettings,
    responses(
        (status = 200, description = "Discussion settings saved", body = DiscussionSettings),
        (status = 400, description = "Page size out of range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("moderator_token" = [])
    )
)]
pub async fn save_discussion_settings(
    State(state): State<AppState>,
    Extension(_claims): Extension<ModeratorClaims>,
    Json(settings): Json<DiscussionSettings>,
) -> Result<Json<DiscussionSettings>, AppError> {
    if !(1..=100).contains(&settings.comments_per_page) {
        return Err(AppError::BadRequest(
            "comments_per_page must be between 1 and 100".to_string(),
        ));
    }

    state.options.save_discussion_settings(&settings).await?;
    Ok(Json(settings))
}

/// Derives the review theme stylesheet from the stored palette.
#[utoipa::path(
    get,
    path = "/assets/review-theme.css",
    responses(
        (status = 200, description = "Palette-derived stylesheet", content_type = "text/css")
    )
)]
pub async fn theme_css(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state.options.review_settings().await?;
    let css = render_theme_css(&settings.colors);
    Ok(([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css))
}

fn render_theme_css(palette: &Palette) -> String {
    format!(
        ":root {{\n  \
         --review-primary: {primary};\n  \
         --review-background: {background};\n  \
         --review-border: {border};\n  \
         --review-text: {text};\n  \
         --review-accent: {accent};\n\
         }}\n\n\
         .review-image-grid {{\n  \
         display: grid;\n  \
         grid-template-columns: repeat(3, 1fr);\n  \
         gap: 8px;\n\
         }}\n\n\
         .review-image-grid img {{\n  \
         border: 1px solid var(--review-border);\n  \
         background: var(--review-background);\n\
         }}\n\n\
         .review-lightbox {{\n  \
         color: var(--review-text);\n\
         }}\n\n\
         .review-lightbox .nav {{\n  \
         color: var(--review-primary);\n\
         }}\n\n\
         .review-lightbox .close {{\n  \
         color: var(--review-accent);\n\
         }}\n",
        primary = palette.primary,
        background = palette.background,
        border = palette.border,
        text = palette.text,
        accent = palette.accent,
    )
}
