//! Route service implementing the [`RouteService`] driving port.
//!
//! Creation geocodes places that arrive without coordinates. Geocoding is
//! best effort: a missing provider or a failed lookup leaves the place
//! without coordinates, which only excludes it from proximity search.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, MapsSource, MapsSourceError, RouteRepository,
    RouteSearchRequest, RouteService, RouteUpdateRequest, SeatChange, UserRepository,
    VehicleRepository,
};
use crate::domain::service_support::{
    ensure_driver, invalid_field, load_account, load_route, map_booking_repository_error,
    map_maps_source_error, map_route_repository_error, map_vehicle_repository_error,
};
use crate::domain::{
    CarpoolRoute, DirectionsPlan, Error, Place, RouteDraft, RoutePage, RouteStateError,
    RouteTransition, RouteUpdate, RouteValidationError, UserId, UserRole,
    route_directions_request, search,
};

fn map_validation(err: RouteValidationError) -> Error {
    invalid_field(err.field(), "invalid_route", err.to_string())
}

fn map_state(err: RouteStateError) -> Error {
    Error::conflict(err.to_string())
}

/// Route publishing, search, and lifecycle.
#[derive(Clone)]
pub struct RouteServiceImpl {
    users: Arc<dyn UserRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    routes: Arc<dyn RouteRepository>,
    bookings: Arc<dyn BookingRepository>,
    maps: Arc<dyn MapsSource>,
    clock: Arc<dyn Clock>,
}

impl RouteServiceImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        routes: Arc<dyn RouteRepository>,
        bookings: Arc<dyn BookingRepository>,
        maps: Arc<dyn MapsSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            vehicles,
            routes,
            bookings,
            maps,
            clock,
        }
    }

    async fn geocode_missing(&self, place: &mut Place) {
        if place.coordinates.is_some() {
            return;
        }
        match self.maps.geocode(&place.address).await {
            Ok(result) => place.coordinates = Some(result.coordinates),
            Err(MapsSourceError::NotConfigured) => {}
            Err(err) => {
                warn!(address = %place.address, error = %err, "geocoding route place failed");
            }
        }
    }

    async fn geocode_draft(&self, draft: &mut RouteDraft) {
        self.geocode_missing(&mut draft.origin).await;
        self.geocode_missing(&mut draft.destination).await;
        for waypoint in &mut draft.waypoints {
            self.geocode_missing(waypoint).await;
        }
    }

    async fn driven_route(&self, driver: &UserId, route_id: &Uuid) -> Result<CarpoolRoute, Error> {
        let route = load_route(self.routes.as_ref(), route_id).await?;
        ensure_driver(&route, driver)?;
        Ok(route)
    }

    async fn cancel_active_bookings(&self, route_id: &Uuid) -> Result<usize, Error> {
        let bookings = self
            .bookings
            .list_by_route(route_id)
            .await
            .map_err(map_booking_repository_error)?;
        let mut cancelled = 0;
        for mut booking in bookings
            .into_iter()
            .filter(|booking| booking.status.is_active())
        {
            let from = booking.status;
            booking.cancel().map_err(|err| Error::conflict(err.to_string()))?;
            match self
                .bookings
                .transition(&booking, from, SeatChange::None)
                .await
            {
                Ok(()) => cancelled += 1,
                // The passenger cancelled it first.
                Err(BookingRepositoryError::Conflict { .. }) => {}
                Err(err) => return Err(map_booking_repository_error(err)),
            }
        }
        Ok(cancelled)
    }
}

#[async_trait]
impl RouteService for RouteServiceImpl {
    async fn create(&self, driver: &UserId, mut draft: RouteDraft) -> Result<CarpoolRoute, Error> {
        let account = load_account(self.users.as_ref(), driver).await?;
        if account.user.role != UserRole::Driver {
            return Err(Error::forbidden("only drivers can publish routes"));
        }
        let vehicle = self
            .vehicles
            .find_by_id(&draft.vehicle_id)
            .await
            .map_err(map_vehicle_repository_error)?
            .ok_or_else(|| {
                invalid_field(
                    "vehicleId",
                    "unknown_vehicle",
                    format!("vehicle {} not found", draft.vehicle_id),
                )
            })?;
        if &vehicle.owner_id != driver {
            return Err(Error::forbidden("vehicle belongs to another user"));
        }

        self.geocode_draft(&mut draft).await;
        let route = draft
            .into_route(Uuid::new_v4(), driver.clone(), &vehicle, self.clock.utc())
            .map_err(map_validation)?;
        self.routes
            .create(&route)
            .await
            .map_err(map_route_repository_error)?;
        info!(route_id = %route.id, driver = %driver, "published route");
        Ok(route)
    }

    async fn search(&self, request: RouteSearchRequest) -> Result<RoutePage, Error> {
        let RouteSearchRequest {
            filter,
            sort,
            pagination,
        } = request;
        let candidates = self
            .routes
            .list_searchable(filter.include_past)
            .await
            .map_err(map_route_repository_error)?;
        let matched = search(candidates, &filter, sort, self.clock.utc())
            .map_err(|err| invalid_field(err.field(), "invalid_search", err.to_string()))?;
        let total = matched.len();
        Ok(RoutePage {
            routes: pagination.apply(matched),
            total,
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
    }

    async fn get(&self, route_id: &Uuid) -> Result<CarpoolRoute, Error> {
        load_route(self.routes.as_ref(), route_id).await
    }

    async fn list_mine(&self, driver: &UserId) -> Result<Vec<CarpoolRoute>, Error> {
        self.routes
            .list_by_driver(driver)
            .await
            .map_err(map_route_repository_error)
    }

    async fn update(
        &self,
        driver: &UserId,
        route_id: &Uuid,
        request: RouteUpdateRequest,
    ) -> Result<CarpoolRoute, Error> {
        let mut route = self.driven_route(driver, route_id).await?;
        let RouteUpdateRequest {
            departure_at,
            price_per_seat_cents,
            notes,
            mut waypoints,
        } = request;
        if let Some(places) = waypoints.as_mut() {
            for place in places.iter_mut() {
                self.geocode_missing(place).await;
            }
        }
        let update = RouteUpdate::try_new(
            departure_at,
            price_per_seat_cents,
            notes.as_deref(),
            waypoints,
            self.clock.utc(),
        )
        .map_err(map_validation)?;
        let expected = route.status;
        route.apply(update).map_err(map_state)?;
        self.routes
            .update(&route, expected)
            .await
            .map_err(map_route_repository_error)?;
        Ok(route)
    }

    async fn transition(
        &self,
        driver: &UserId,
        route_id: &Uuid,
        transition: RouteTransition,
    ) -> Result<CarpoolRoute, Error> {
        let mut route = self.driven_route(driver, route_id).await?;
        let expected = route.status;
        route.transition(transition).map_err(map_state)?;
        self.routes
            .update(&route, expected)
            .await
            .map_err(map_route_repository_error)?;
        if transition == RouteTransition::Cancel {
            let cancelled = self.cancel_active_bookings(route_id).await?;
            info!(route_id = %route_id, cancelled, "cancelled route and its bookings");
        } else {
            info!(route_id = %route_id, status = %route.status, "route status changed");
        }
        Ok(route)
    }

    async fn directions(&self, route_id: &Uuid) -> Result<DirectionsPlan, Error> {
        let route = load_route(self.routes.as_ref(), route_id).await?;
        let bookings = self
            .bookings
            .list_by_route(route_id)
            .await
            .map_err(map_booking_repository_error)?;
        let request = route_directions_request(&route, &bookings)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.maps
            .directions(&request)
            .await
            .map_err(map_maps_source_error)
    }
}

#[cfg(test)]
#[path = "route_service_tests.rs"]
mod tests;
