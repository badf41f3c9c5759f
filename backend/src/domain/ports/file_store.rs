//! Port for blob storage of uploaded files.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by blob storage adapters.
    pub enum FileStoreError {
        /// Reading or writing the underlying storage failed.
        Io { message: String } => "file storage failed: {message}",
        /// No blob is stored under the name.
        NotFound { name: String } => "stored file {name} not found",
        /// The name would escape the storage root or is otherwise unusable.
        InvalidName { name: String } => "invalid stored file name: {name}",
    }
}

/// Flat blob storage keyed by generated file names (`{uuid}.{ext}`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), FileStoreError>;

    async fn get(&self, name: &str) -> Result<Vec<u8>, FileStoreError>;

    /// Remove a blob. Missing blobs are not an error.
    async fn delete(&self, name: &str) -> Result<(), FileStoreError>;
}
