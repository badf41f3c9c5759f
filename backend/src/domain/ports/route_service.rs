//! Driving port for publishing, searching, and driving routes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    CarpoolRoute, DirectionsPlan, Error, Pagination, Place, RouteDraft, RouteFilter, RoutePage,
    RouteSort, RouteTransition, UserId,
};

/// Raw route changes; validated by the service against the current time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteUpdateRequest {
    pub departure_at: Option<DateTime<Utc>>,
    pub price_per_seat_cents: Option<i64>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
    pub waypoints: Option<Vec<Place>>,
}

/// Search parameters accepted by [`RouteService::search`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteSearchRequest {
    pub filter: RouteFilter,
    pub sort: RouteSort,
    pub pagination: Pagination,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteService: Send + Sync {
    /// Publish a route using one of the driver's vehicles.
    async fn create(&self, driver: &UserId, draft: RouteDraft) -> Result<CarpoolRoute, Error>;

    async fn search(&self, request: RouteSearchRequest) -> Result<RoutePage, Error>;

    async fn get(&self, route_id: &Uuid) -> Result<CarpoolRoute, Error>;

    /// Routes the caller drives.
    async fn list_mine(&self, driver: &UserId) -> Result<Vec<CarpoolRoute>, Error>;

    async fn update(
        &self,
        driver: &UserId,
        route_id: &Uuid,
        request: RouteUpdateRequest,
    ) -> Result<CarpoolRoute, Error>;

    /// Start, complete, or cancel a route.
    async fn transition(
        &self,
        driver: &UserId,
        route_id: &Uuid,
        transition: RouteTransition,
    ) -> Result<CarpoolRoute, Error>;

    /// Driving plan covering waypoints and accepted pickups.
    async fn directions(&self, route_id: &Uuid) -> Result<DirectionsPlan, Error>;
}
