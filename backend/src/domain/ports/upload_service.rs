//! Driving port for file uploads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, StoredFile, UploadPurpose, UserId};

/// An upload received from a client.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub purpose: UploadPurpose,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stored metadata plus file contents.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDownload {
    pub file: StoredFile,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Validate and store a file, linking avatars and licences to the owner.
    async fn store(&self, owner: &UserId, request: UploadRequest) -> Result<StoredFile, Error>;

    /// Owners may fetch any of their files; avatars are visible to everyone.
    async fn fetch(&self, requester: &UserId, file_id: &Uuid) -> Result<FileDownload, Error>;

    async fn delete(&self, owner: &UserId, file_id: &Uuid) -> Result<(), Error>;
}
