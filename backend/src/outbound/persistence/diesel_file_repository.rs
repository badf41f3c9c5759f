//! PostgreSQL-backed `FileRepository` for upload metadata.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::StoredFile;
use crate::domain::ports::{FileRepository, FileRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error};
use super::models::StoredFileRow;
use super::pool::{DbPool, PoolError};
use super::schema::stored_files;

#[derive(Clone)]
pub struct DieselFileRepository {
    pool: DbPool,
}

impl DieselFileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> FileRepositoryError {
    map_pool_error(error, FileRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> FileRepositoryError {
    map_diesel_error(
        error,
        FileRepositoryError::query,
        FileRepositoryError::connection,
    )
}

#[async_trait]
impl FileRepository for DieselFileRepository {
    async fn create(&self, file: &StoredFile) -> Result<(), FileRepositoryError> {
        let row = StoredFileRow::try_from(file)
            .map_err(|err| map_row_error(err, FileRepositoryError::query))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(stored_files::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<StoredFile>, FileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = stored_files::table
            .find(id)
            .select(StoredFileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(StoredFile::try_from)
            .transpose()
            .map_err(|err| map_row_error(err, FileRepositoryError::query))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, FileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(stored_files::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(deleted > 0)
    }
}
