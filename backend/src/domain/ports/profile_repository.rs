//! Port for driver and passenger profile persistence.
use async_trait::async_trait;

use crate::domain::{DriverProfile, PassengerProfile, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
    }
}

/// Storage for role-specific profiles. Each user has at most one of each.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace the driver profile keyed by its user.
    async fn save_driver(&self, profile: &DriverProfile) -> Result<(), ProfileRepositoryError>;

    async fn find_driver(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DriverProfile>, ProfileRepositoryError>;

    /// Insert or replace the passenger profile keyed by its user.
    async fn save_passenger(
        &self,
        profile: &PassengerProfile,
    ) -> Result<(), ProfileRepositoryError>;

    async fn find_passenger(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PassengerProfile>, ProfileRepositoryError>;
}
