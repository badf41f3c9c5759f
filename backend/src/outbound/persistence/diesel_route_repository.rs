//! PostgreSQL-backed `RouteRepository`.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RouteRepository, RouteRepositoryError};
use crate::domain::{CarpoolRoute, RouteStatus, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error};
use super::models::{RouteChangeset, RouteRow};
use super::pool::{DbPool, PoolError};
use super::schema::routes;

#[derive(Clone)]
pub struct DieselRouteRepository {
    pool: DbPool,
}

impl DieselRouteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RouteRepositoryError {
    map_pool_error(error, RouteRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> RouteRepositoryError {
    map_diesel_error(
        error,
        RouteRepositoryError::query,
        RouteRepositoryError::connection,
    )
}

fn into_routes(rows: Vec<RouteRow>) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
    rows.into_iter()
        .map(CarpoolRoute::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| map_row_error(err, RouteRepositoryError::query))
}

#[async_trait]
impl RouteRepository for DieselRouteRepository {
    async fn create(&self, route: &CarpoolRoute) -> Result<(), RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(routes::table)
            .values(RouteRow::from(route))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn update(
        &self,
        route: &CarpoolRoute,
        expected: RouteStatus,
    ) -> Result<(), RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            routes::table
                .find(route.id)
                .filter(routes::status.eq(expected.as_str())),
        )
        .set(RouteChangeset::from(route))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        if updated > 0 {
            return Ok(());
        }
        let current: Option<String> = routes::table
            .find(route.id)
            .select(routes::status)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        match current {
            Some(status) => Err(RouteRepositoryError::conflict(format!(
                "route is now {status}"
            ))),
            None => Err(RouteRepositoryError::query(format!(
                "route {} does not exist",
                route.id
            ))),
        }
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<CarpoolRoute>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = routes::table
            .find(id)
            .select(RouteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(into_routes(row.into_iter().collect())?.pop())
    }

    async fn list_searchable(
        &self,
        include_past: bool,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let query = routes::table
            .select(RouteRow::as_select())
            .order(routes::departure_at.asc())
            .into_boxed();
        let query = if include_past {
            query.filter(routes::status.ne(RouteStatus::Cancelled.as_str()))
        } else {
            query.filter(routes::status.eq(RouteStatus::Scheduled.as_str()))
        };
        let rows = query.load(&mut conn).await.map_err(diesel_error)?;
        into_routes(rows)
    }

    async fn list_by_driver(
        &self,
        driver: &UserId,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = routes::table
            .filter(routes::driver_id.eq(driver.as_uuid()))
            .order(routes::departure_at.asc())
            .select(RouteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        into_routes(rows)
    }

    async fn has_active_for_vehicle(
        &self,
        vehicle_id: &Uuid,
    ) -> Result<bool, RouteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let finished = [
            RouteStatus::Completed.as_str(),
            RouteStatus::Cancelled.as_str(),
        ];
        diesel::select(exists(
            routes::table
                .filter(routes::vehicle_id.eq(vehicle_id))
                .filter(routes::status.ne_all(finished)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }
}
