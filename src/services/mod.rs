pub mod attachments;
pub mod gallery;
pub mod media;
pub mod moderation;
pub mod options;
pub mod upload;
