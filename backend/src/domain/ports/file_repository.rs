//! Port for uploaded file metadata.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::StoredFile;

use super::define_port_error;

define_port_error! {
    /// Errors raised by file metadata adapters.
    pub enum FileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "file repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "file repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn create(&self, file: &StoredFile) -> Result<(), FileRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<StoredFile>, FileRepositoryError>;

    /// Remove metadata; returns whether a row was deleted.
    async fn delete(&self, id: &Uuid) -> Result<bool, FileRepositoryError>;
}
