//! Driving port for vehicle management.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, UserId, Vehicle, VehicleDraft, VehicleUpdate};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleService: Send + Sync {
    /// Register a vehicle for a driver.
    async fn register(&self, owner: &UserId, draft: VehicleDraft) -> Result<Vehicle, Error>;

    async fn list_mine(&self, owner: &UserId) -> Result<Vec<Vehicle>, Error>;

    /// Fetch one of the caller's vehicles.
    async fn get(&self, owner: &UserId, vehicle_id: &Uuid) -> Result<Vehicle, Error>;

    async fn update(
        &self,
        owner: &UserId,
        vehicle_id: &Uuid,
        update: VehicleUpdate,
    ) -> Result<Vehicle, Error>;

    /// Remove a vehicle that no scheduled or running route uses.
    async fn delete(&self, owner: &UserId, vehicle_id: &Uuid) -> Result<(), Error>;
}
