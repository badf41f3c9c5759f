//! Port for vehicle persistence.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{UserId, Vehicle};

use super::define_port_error;

define_port_error! {
    /// Errors raised by vehicle repository adapters.
    pub enum VehicleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "vehicle repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "vehicle repository query failed: {message}",
        /// The licence plate is registered to another vehicle.
        DuplicatePlate { plate: String } => "plate {plate} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert a vehicle. Plates are unique across all owners.
    async fn create(&self, vehicle: &Vehicle) -> Result<(), VehicleRepositoryError>;

    /// Replace a stored vehicle.
    async fn update(&self, vehicle: &Vehicle) -> Result<(), VehicleRepositoryError>;

    /// Remove a vehicle; returns whether a row was deleted.
    async fn delete(&self, id: &Uuid) -> Result<bool, VehicleRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Vehicle>, VehicleRepositoryError>;

    /// Vehicles owned by `owner`, oldest first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Vehicle>, VehicleRepositoryError>;
}
