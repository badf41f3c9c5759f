//! Port for booking (route passenger) persistence.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "booking repository query failed: {message}",
        /// The passenger already holds an active booking on the route.
        DuplicateActive { route_id: Uuid } =>
            "passenger already has an active booking on route {route_id}",
        /// A guarded write found the stored rows in a different state.
        Conflict { message: String } => "{message}",
    }
}

/// Seat adjustment applied to the booking's route together with a status
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatChange {
    None,
    /// Take seats from a scheduled route that still has enough free.
    Reserve(u8),
    /// Give seats back to a scheduled route.
    Release(u8),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking. At most one pending or accepted booking may exist
    /// per passenger and route.
    async fn create(&self, booking: &Booking) -> Result<(), BookingRepositoryError>;

    /// Store `booking.status` if the stored status is still `from`, and
    /// apply `seats` to its route in the same atomic step.
    ///
    /// Nothing is written and `Conflict` is returned when the booking has
    /// moved on, or when the route is no longer scheduled or lacks the seats
    /// a reservation needs.
    async fn transition(
        &self,
        booking: &Booking,
        from: BookingStatus,
        seats: SeatChange,
    ) -> Result<(), BookingRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError>;

    /// Bookings on a route, oldest first.
    async fn list_by_route(&self, route_id: &Uuid) -> Result<Vec<Booking>, BookingRepositoryError>;

    /// Bookings made by a passenger, newest first.
    async fn list_by_passenger(
        &self,
        passenger: &UserId,
    ) -> Result<Vec<Booking>, BookingRepositoryError>;
}
