//! Port for carpool route persistence.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{CarpoolRoute, RouteStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by route repository adapters.
    pub enum RouteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "route repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "route repository query failed: {message}",
        /// The stored route left the status the caller read.
        Conflict { message: String } => "{message}",
    }
}

/// Storage for published routes.
///
/// Search filtering and ordering happen in the domain, so adapters only
/// need to return the candidate set.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn create(&self, route: &CarpoolRoute) -> Result<(), RouteRepositoryError>;

    /// Store the driver-editable fields and status of `route` while the
    /// stored status still equals `expected`.
    ///
    /// Seat counts belong to booking transitions and are never written here.
    async fn update(
        &self,
        route: &CarpoolRoute,
        expected: RouteStatus,
    ) -> Result<(), RouteRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<CarpoolRoute>, RouteRepositoryError>;

    /// Candidate routes for search: scheduled ones, plus every non-cancelled
    /// route when `include_past` is set.
    async fn list_searchable(
        &self,
        include_past: bool,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError>;

    /// Routes published by `driver`, soonest departure first.
    async fn list_by_driver(
        &self,
        driver: &UserId,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError>;

    /// Whether a scheduled or in-progress route uses the vehicle.
    async fn has_active_for_vehicle(
        &self,
        vehicle_id: &Uuid,
    ) -> Result<bool, RouteRepositoryError>;
}
