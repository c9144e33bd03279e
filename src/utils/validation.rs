use std::path::Path;

/// Hard cap on images accepted per review
pub const MAX_IMAGES_PER_REVIEW: usize = 3;

/// Single-file cap: 1.2 MB
pub const MAX_IMAGE_BYTES: usize = 1_258_291;

/// Total-batch budget per review: 3.6 MB
pub const MAX_BATCH_BYTES: usize = 3_774_873;

/// MIME allow-list for review images
pub const ALLOWED_IMAGE_MIMES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// File extensions accepted for each allowed MIME type
const ALLOWED_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRejection {
    NotAnAllowedImage,
}

impl std::fmt::Display for FileRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileRejection::NotAnAllowedImage => {
                write!(f, "file is not a jpeg, png, or webp image")
            }
        }
    }
}

/// Content-sniffs a candidate image. The extension, the declared MIME type
/// (when present), and the magic bytes must all agree on one entry of the
/// allow-list. Returns the canonical MIME type on success.
pub fn sniff_image_type(
    filename: &str,
    declared_mime: Option<&str>,
    data: &[u8],
) -> Result<&'static str, FileRejection> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let expected = ALLOWED_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, m)| *m)
        .ok_or(FileRejection::NotAnAllowedImage)?;

    // Declared MIME, when the client sent one, must match the extension.
    if let Some(declared) = declared_mime {
        let normalized = declared.split(';').next().unwrap_or("").trim().to_lowercase();
        if normalized != expected {
            return Err(FileRejection::NotAnAllowedImage);
        }
    }

    // Magic bytes have the final say. A script renamed to .jpg sniffs as
    // something other than an allowed image and is rejected here.
    let detected = infer::get(data).ok_or(FileRejection::NotAnAllowedImage)?;
    if detected.mime_type() != expected {
        return Err(FileRejection::NotAnAllowedImage);
    }

    Ok(expected)
}

/// Reduces an operator-supplied storage subdirectory to a single path-safe
/// segment: no separators, no traversal, no hidden prefix.
pub fn sanitize_subdir(subdir: &str) -> String {
    let cleaned: String = subdir
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "review-images".to_string()
    } else {
        trimmed.to_string()
    }
}

/// True for exactly `#` followed by six hex digits.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
