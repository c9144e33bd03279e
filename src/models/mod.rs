use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payload of the "review created" lifecycle event. Built once at the HTTP
/// boundary; the upload workflow never sees raw multipart structures.
#[derive(Debug)]
pub struct ReviewCreated {
    pub review_id: String,
    pub subject_id: String,
    pub is_logged_in: bool,
    pub files: Vec<UploadedFile>,
}

/// One candidate file from a review submission, in upload order.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub declared_mime: Option<String>,
    pub data: Vec<u8>,
    pub transport_error: Option<TransportError>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Transport-level outcome for a single multipart field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Field was present but carried no file.
    NoFile,
    /// Any other transport failure (truncated read, aborted stream).
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

/// Images accepted for one review. At most three attachment ids, kept in
/// upload order; the approval flag covers the whole batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewImageAttachment {
    pub review_id: String,
    pub attachment_ids: Vec<String>,
    pub approval_status: ApprovalStatus,
}

/// Named rendition of a stored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeVariant {
    Thumbnail,
    Full,
}

impl SizeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeVariant::Thumbnail => "thumbnail",
            SizeVariant::Full => "full",
        }
    }
}

/// One publicly visible image of a review.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisibleImage {
    pub id: String,
    pub thumbnail_url: String,
    pub full_url: String,
}

/// Palette roles used to theme the review UI. Values are `#rrggbb` strings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Palette {
    pub primary: String,
    pub background: String,
    pub border: String,
    pub text: String,
    pub accent: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: "#3582c4".to_string(),
            background: "#ffffff".to_string(),
            border: "#dcdcde".to_string(),
            text: "#1d2327".to_string(),
            accent: "#d63638".to_string(),
        }
    }
}

/// Operator-editable review settings, stored as one composite option.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewSettings {
    pub colors: Palette,
    pub show_website_field: bool,
    pub allow_images: bool,
    pub allow_images_guests: bool,
    pub require_image_approval: bool,
    pub images_subdir: String,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            colors: Palette::default(),
            show_website_field: false,
            allow_images: true,
            allow_images_guests: false,
            require_image_approval: true,
            images_subdir: "review-images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentOrder {
    Asc,
    Desc,
}

/// Host-level discussion keys mirrored through the option store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscussionSettings {
    pub comments_per_page: i64,
    pub comment_order: CommentOrder,
}

impl Default for DiscussionSettings {
    fn default() -> Self {
        Self {
            comments_per_page: 10,
            comment_order: CommentOrder::Desc,
        }
    }
}

/// Delegated capability check for moderation actions. The backend only asks
/// the host-provided claim whether moderation is allowed; it never
/// authenticates users itself.
pub trait Capabilities: Send + Sync {
    fn can_moderate(&self) -> bool;
}

/// Claim inserted by the moderator auth middleware.
#[derive(Debug, Clone)]
pub struct ModeratorClaims {
    pub can_moderate: bool,
}

impl Capabilities for ModeratorClaims {
    fn can_moderate(&self) -> bool {
        self.can_moderate
    }
}
