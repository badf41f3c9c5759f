//! Driving port for seat requests on routes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Booking, Error, Place, UserId};

/// A passenger's seat request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub route_id: Uuid,
    pub seats: u8,
    pub pickup: Option<Place>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingService: Send + Sync {
    async fn request(
        &self,
        passenger: &UserId,
        request: BookingRequest,
    ) -> Result<Booking, Error>;

    /// Bookings on a route; only its driver may list them.
    async fn list_for_route(
        &self,
        driver: &UserId,
        route_id: &Uuid,
    ) -> Result<Vec<Booking>, Error>;

    async fn list_mine(&self, passenger: &UserId) -> Result<Vec<Booking>, Error>;

    /// Driver accepts a pending booking, reserving its seats.
    async fn accept(&self, driver: &UserId, booking_id: &Uuid) -> Result<Booking, Error>;

    async fn reject(&self, driver: &UserId, booking_id: &Uuid) -> Result<Booking, Error>;

    /// Passenger withdraws; accepted seats go back to the route.
    async fn cancel(&self, passenger: &UserId, booking_id: &Uuid) -> Result<Booking, Error>;
}
