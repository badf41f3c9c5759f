//! PostgreSQL-backed `VehicleRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{VehicleRepository, VehicleRepositoryError};
use crate::domain::{UserId, Vehicle};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error, unique_violation};
use super::models::VehicleRow;
use super::pool::{DbPool, PoolError};
use super::schema::vehicles;

#[derive(Clone)]
pub struct DieselVehicleRepository {
    pool: DbPool,
}

impl DieselVehicleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> VehicleRepositoryError {
    map_pool_error(error, VehicleRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error, vehicle: Option<&Vehicle>) -> VehicleRepositoryError {
    if let (Some(_), Some(vehicle)) = (unique_violation(&error), vehicle) {
        return VehicleRepositoryError::duplicate_plate(vehicle.plate.as_ref());
    }
    map_diesel_error(
        error,
        VehicleRepositoryError::query,
        VehicleRepositoryError::connection,
    )
}

fn into_vehicles(rows: Vec<VehicleRow>) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
    rows.into_iter()
        .map(Vehicle::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| map_row_error(err, VehicleRepositoryError::query))
}

#[async_trait]
impl VehicleRepository for DieselVehicleRepository {
    async fn create(&self, vehicle: &Vehicle) -> Result<(), VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(vehicles::table)
            .values(VehicleRow::from(vehicle))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| diesel_error(err, Some(vehicle)))
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<(), VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(vehicles::table.find(vehicle.id))
            .set(VehicleRow::from(vehicle))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(err, Some(vehicle)))?;
        if updated == 0 {
            return Err(VehicleRepositoryError::query(format!(
                "vehicle {} does not exist",
                vehicle.id
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(vehicles::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(err, None))?;
        Ok(deleted > 0)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = vehicles::table
            .find(id)
            .select(VehicleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(err, None))?;
        Ok(into_vehicles(row.into_iter().collect())?.pop())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = vehicles::table
            .filter(vehicles::owner_id.eq(owner.as_uuid()))
            .order(vehicles::make.asc())
            .select(VehicleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| diesel_error(err, None))?;
        into_vehicles(rows)
    }
}
