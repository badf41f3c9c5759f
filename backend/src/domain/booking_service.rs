//! Booking service implementing the [`BookingService`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    BookingRepository, BookingRequest, BookingService, RouteRepository, SeatChange,
};
use crate::domain::service_support::{
    ensure_driver, invalid_field, load_booking, load_route, map_booking_repository_error,
};
use crate::domain::{Booking, BookingStateError, Error, RouteStateError, UserId};

fn map_booking_state(err: BookingStateError) -> Error {
    Error::conflict(err.to_string())
}

fn map_route_state(err: RouteStateError) -> Error {
    Error::conflict(err.to_string())
}

/// Seat requests and their driver/passenger transitions.
#[derive(Clone)]
pub struct BookingServiceImpl {
    routes: Arc<dyn RouteRepository>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl BookingServiceImpl {
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            routes,
            bookings,
            clock,
        }
    }
}

#[async_trait]
impl BookingService for BookingServiceImpl {
    async fn request(
        &self,
        passenger: &UserId,
        request: BookingRequest,
    ) -> Result<Booking, Error> {
        let BookingRequest {
            route_id,
            seats,
            pickup,
        } = request;
        let route = load_route(self.routes.as_ref(), &route_id).await?;
        if &route.driver_id == passenger {
            return Err(Error::forbidden("drivers cannot book their own route"));
        }
        route.ensure_scheduled().map_err(map_route_state)?;
        let now = self.clock.utc();
        if route.departure_at <= now {
            return Err(Error::conflict("route has already departed"));
        }
        if seats > route.seats_available {
            return Err(map_route_state(RouteStateError::InsufficientSeats {
                requested: seats,
                available: route.seats_available,
            }));
        }

        let existing = self
            .bookings
            .list_by_route(&route_id)
            .await
            .map_err(map_booking_repository_error)?;
        if existing
            .iter()
            .any(|booking| &booking.passenger_id == passenger && booking.status.is_active())
        {
            return Err(Error::conflict(format!(
                "you already have an active booking on route {route_id}"
            )));
        }

        let booking = Booking::request(
            Uuid::new_v4(),
            route_id,
            passenger.clone(),
            seats,
            pickup,
            now,
        )
        .map_err(|err| invalid_field("seats", "out_of_range", err.to_string()))?;
        self.bookings
            .create(&booking)
            .await
            .map_err(map_booking_repository_error)?;
        info!(booking_id = %booking.id, route_id = %route_id, seats, "booking requested");
        Ok(booking)
    }

    async fn list_for_route(
        &self,
        driver: &UserId,
        route_id: &Uuid,
    ) -> Result<Vec<Booking>, Error> {
        let route = load_route(self.routes.as_ref(), route_id).await?;
        ensure_driver(&route, driver)?;
        self.bookings
            .list_by_route(route_id)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn list_mine(&self, passenger: &UserId) -> Result<Vec<Booking>, Error> {
        self.bookings
            .list_by_passenger(passenger)
            .await
            .map_err(map_booking_repository_error)
    }

    async fn accept(&self, driver: &UserId, booking_id: &Uuid) -> Result<Booking, Error> {
        let mut booking = load_booking(self.bookings.as_ref(), booking_id).await?;
        let mut route = load_route(self.routes.as_ref(), &booking.route_id).await?;
        ensure_driver(&route, driver)?;
        route.ensure_scheduled().map_err(map_route_state)?;
        let from = booking.status;
        booking.accept().map_err(map_booking_state)?;
        route.reserve_seats(booking.seats).map_err(map_route_state)?;
        self.bookings
            .transition(&booking, from, SeatChange::Reserve(booking.seats))
            .await
            .map_err(map_booking_repository_error)?;
        info!(
            booking_id = %booking.id,
            seats = booking.seats,
            "booking accepted"
        );
        Ok(booking)
    }

    async fn reject(&self, driver: &UserId, booking_id: &Uuid) -> Result<Booking, Error> {
        let mut booking = load_booking(self.bookings.as_ref(), booking_id).await?;
        let route = load_route(self.routes.as_ref(), &booking.route_id).await?;
        ensure_driver(&route, driver)?;
        let from = booking.status;
        booking.reject().map_err(map_booking_state)?;
        self.bookings
            .transition(&booking, from, SeatChange::None)
            .await
            .map_err(map_booking_repository_error)?;
        Ok(booking)
    }

    async fn cancel(&self, passenger: &UserId, booking_id: &Uuid) -> Result<Booking, Error> {
        let mut booking = load_booking(self.bookings.as_ref(), booking_id).await?;
        if &booking.passenger_id != passenger {
            return Err(Error::forbidden("only the passenger may cancel a booking"));
        }
        let route = load_route(self.routes.as_ref(), &booking.route_id).await?;
        route.ensure_scheduled().map_err(map_route_state)?;
        let from = booking.status;
        let released = booking.cancel().map_err(map_booking_state)?;
        let seats = if released > 0 {
            SeatChange::Release(released)
        } else {
            SeatChange::None
        };
        self.bookings
            .transition(&booking, from, seats)
            .await
            .map_err(map_booking_repository_error)?;
        Ok(booking)
    }
}

#[cfg(test)]
#[path = "booking_service_tests.rs"]
mod tests;
