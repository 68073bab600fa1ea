//! Input validation for domain operations.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// An operation referenced the acting profile itself.
    SelfReference(&'static str),
    /// Upload MIME type is not a video type.
    InvalidMimeType(String),
    /// Upload exceeds the size bound.
    TooLarge { max_bytes: u64, actual_bytes: u64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::SelfReference(what) => {
                write!(f, "cannot {} your own profile", what)
            }
            ValidationError::InvalidMimeType(mime) => {
                write!(f, "unsupported MIME type '{}' (must be video/*)", mime)
            }
            ValidationError::TooLarge {
                max_bytes,
                actual_bytes,
            } => {
                write!(
                    f,
                    "upload is too large ({} bytes, max {})",
                    actual_bytes, max_bytes
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Hard cap on list page sizes; callers asking for more receive the cap.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum allowed length for message content.
pub const MAX_MESSAGE_LENGTH: usize = 5_000;

/// Maximum allowed length for titles and short text fields.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum accepted video upload size (500 MB).
pub const MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;

/// Clamp a requested page size to `[1, MAX_PAGE_SIZE]`.
///
/// Zero or negative requests fall back to the operation's default.
pub fn clamp_limit(limit: i64, default: i64) -> i64 {
    if limit <= 0 {
        default
    } else {
        limit.min(MAX_PAGE_SIZE)
    }
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: i64) -> i64 {
    offset.max(0)
}

/// Validate a required free-text field: non-empty after trimming, bounded.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual: value.len(),
        });
    }

    Ok(())
}

/// Validate the declared metadata of a video upload.
///
/// The binary itself lives in external object storage; the store only checks
/// what the caller declares before persisting the reference.
pub fn validate_video_upload(
    title: &str,
    video_url: &str,
    mime_type: &str,
    size_bytes: u64,
) -> Result<(), ValidationError> {
    validate_text("title", title, MAX_TITLE_LENGTH)?;

    if video_url.trim().is_empty() {
        return Err(ValidationError::Empty("video_url".to_string()));
    }

    if !mime_type.starts_with("video/") {
        return Err(ValidationError::InvalidMimeType(mime_type.to_string()));
    }

    if size_bytes > MAX_VIDEO_BYTES {
        return Err(ValidationError::TooLarge {
            max_bytes: MAX_VIDEO_BYTES,
            actual_bytes: size_bytes,
        });
    }

    Ok(())
}
