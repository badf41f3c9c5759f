//! PostgreSQL-backed `RatingRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RatingRepository, RatingRepositoryError};
use crate::domain::{Rating, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error, unique_violation};
use super::models::RatingRow;
use super::pool::{DbPool, PoolError};
use super::schema::ratings;

#[derive(Clone)]
pub struct DieselRatingRepository {
    pool: DbPool,
}

impl DieselRatingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RatingRepositoryError {
    map_pool_error(error, RatingRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> RatingRepositoryError {
    if unique_violation(&error).is_some() {
        return RatingRepositoryError::duplicate();
    }
    map_diesel_error(
        error,
        RatingRepositoryError::query,
        RatingRepositoryError::connection,
    )
}

fn into_ratings(rows: Vec<RatingRow>) -> Result<Vec<Rating>, RatingRepositoryError> {
    rows.into_iter()
        .map(Rating::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| map_row_error(err, RatingRepositoryError::query))
}

#[async_trait]
impl RatingRepository for DieselRatingRepository {
    async fn create(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(ratings::table)
            .values(RatingRow::from(rating))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn list_for_ratee(&self, ratee: &UserId) -> Result<Vec<Rating>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = ratings::table
            .filter(ratings::ratee_id.eq(ratee.as_uuid()))
            .order(ratings::created_at.desc())
            .select(RatingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        into_ratings(rows)
    }

    async fn list_for_route(&self, route_id: &Uuid) -> Result<Vec<Rating>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = ratings::table
            .filter(ratings::route_id.eq(route_id))
            .order(ratings::created_at.asc())
            .select(RatingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        into_ratings(rows)
    }
}
