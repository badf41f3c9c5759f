//! File upload policy and stored file metadata.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Default upload ceiling: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

/// Validation errors for uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadValidationError {
    Empty,
    TooLarge { max_bytes: u64 },
    UnsupportedContentType(String),
    UnknownPurpose(String),
}

impl fmt::Display for UploadValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "uploaded file is empty"),
            Self::TooLarge { max_bytes } => {
                write!(f, "uploaded file exceeds the {max_bytes} byte limit")
            }
            Self::UnsupportedContentType(content_type) => {
                write!(f, "content type {content_type} is not allowed")
            }
            Self::UnknownPurpose(raw) => write!(
                f,
                "unknown upload purpose '{raw}'; expected avatar, license, or vehicle"
            ),
        }
    }
}

impl std::error::Error for UploadValidationError {}

/// What an uploaded file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadPurpose {
    Avatar,
    License,
    Vehicle,
}

impl UploadPurpose {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::License => "license",
            Self::Vehicle => "vehicle",
        }
    }
}

impl FromStr for UploadPurpose {
    type Err = UploadValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avatar" => Ok(Self::Avatar),
            "license" => Ok(Self::License),
            "vehicle" => Ok(Self::Vehicle),
            other => Err(UploadValidationError::UnknownPurpose(other.to_owned())),
        }
    }
}

/// Size and content-type limits for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadPolicy {
    /// Policy with a custom byte ceiling.
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Largest accepted upload.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a content type and return the file extension it maps to.
    ///
    /// ```
    /// use backend::domain::UploadPolicy;
    ///
    /// let policy = UploadPolicy::default();
    /// assert_eq!(policy.extension_for("image/PNG"), Ok("png"));
    /// assert!(policy.extension_for("text/html").is_err());
    /// ```
    pub fn extension_for(&self, content_type: &str) -> Result<&'static str, UploadValidationError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        ALLOWED_CONTENT_TYPES
            .iter()
            .find(|(allowed, _)| *allowed == essence)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| UploadValidationError::UnsupportedContentType(essence))
    }

    /// Validate the byte length of an upload.
    pub fn check_size(&self, size: u64) -> Result<(), UploadValidationError> {
        if size == 0 {
            return Err(UploadValidationError::Empty);
        }
        if size > self.max_bytes {
            return Err(UploadValidationError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Reduce a client-supplied file name to a safe base name.
///
/// ```
/// use backend::domain::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_file_name("C:\\Users\\me\\my photo (1).PNG"), "myphoto1.PNG");
/// assert_eq!(sanitize_file_name("..."), "file");
/// ```
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let kept: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = kept.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Metadata for a stored upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub owner_id: UserId,
    pub purpose: UploadPurpose,
    pub original_name: String,
    pub stored_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl StoredFile {
    /// Public URL the file is served from.
    pub fn url(&self) -> String {
        format!("/api/v1/uploads/{}", self.id)
    }
}
