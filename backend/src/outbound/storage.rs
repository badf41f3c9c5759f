//! Filesystem blob storage for uploads.
//!
//! Blobs live flat inside one directory opened through `cap-std`, so a name
//! can never resolve outside it. Names are additionally restricted to the
//! generated `{uuid}.{ext}` shape before touching the filesystem. `cap-std`
//! is synchronous; every call runs on the blocking pool.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::ports::{FileStore, FileStoreError};

/// Blob store rooted at a local directory.
#[derive(Clone)]
pub struct LocalFileStore {
    root: Arc<Dir>,
}

impl LocalFileStore {
    /// Open (creating if needed) the upload directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be created
    /// or opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let root = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    async fn blocking<T, F>(&self, name: &str, op: F) -> Result<T, FileStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir, &str) -> io::Result<T> + Send + 'static,
    {
        validate_name(name)?;
        let root = Arc::clone(&self.root);
        let owned = name.to_owned();
        let result = tokio::task::spawn_blocking(move || op(&root, &owned))
            .await
            .map_err(|err| FileStoreError::io(err.to_string()))?;
        result.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FileStoreError::not_found(name),
            _ => FileStoreError::io(err.to_string()),
        })
    }
}

fn validate_name(name: &str) -> Result<(), FileStoreError> {
    let shaped = !name.is_empty()
        && name.len() <= 128
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if shaped {
        Ok(())
    } else {
        Err(FileStoreError::invalid_name(name))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), FileStoreError> {
        let size = bytes.len();
        self.blocking(name, move |dir, name| dir.write(name, &bytes))
            .await?;
        debug!(stored_name = name, size, "wrote upload blob");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, FileStoreError> {
        self.blocking(name, |dir, name| dir.read(name)).await
    }

    async fn delete(&self, name: &str) -> Result<(), FileStoreError> {
        match self.blocking(name, |dir, name| dir.remove_file(name)).await {
            Ok(()) | Err(FileStoreError::NotFound { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn store() -> (TempDir, LocalFileStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LocalFileStore::open(dir.path().join("uploads")).expect("open store");
        (dir, store)
    }

    #[rstest]
    #[tokio::test]
    async fn blobs_round_trip_and_delete(store: (TempDir, LocalFileStore)) {
        let (_dir, store) = store;
        let name = "6f0c0c8e-3f8c-4d0b-9a53-0a9f3e7f1b2c.png";
        store.put(name, vec![1, 2, 3]).await.expect("put");
        assert_eq!(store.get(name).await.expect("get"), vec![1, 2, 3]);

        store.delete(name).await.expect("delete");
        assert_eq!(
            store.get(name).await.expect_err("gone"),
            FileStoreError::not_found(name)
        );
        store.delete(name).await.expect("second delete is a no-op");
    }

    #[rstest]
    #[case("../escape.png")]
    #[case("nested/file.png")]
    #[case(".hidden")]
    #[case("")]
    #[tokio::test]
    async fn unsafe_names_are_rejected(store: (TempDir, LocalFileStore), #[case] name: &str) {
        let (_dir, store) = store;
        let err = store.put(name, vec![0]).await.expect_err("rejected");
        assert_eq!(err, FileStoreError::invalid_name(name));
    }
}
