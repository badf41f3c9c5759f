//! Seat bookings ("route passengers") and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::place::Place;
use super::user::UserId;

/// Largest number of seats one booking may hold.
pub const BOOKING_SEATS_MAX: u8 = 4;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending and accepted bookings hold (or may hold) seats.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(BookingStateError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Errors raised when a booking transition is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingStateError {
    #[error("booking is {from}; cannot move to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("unknown booking status: {0}")]
    UnknownStatus(String),
}

/// Validation errors for booking requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingValidationError {
    SeatsOutOfRange { max: u8 },
}

impl fmt::Display for BookingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeatsOutOfRange { max } => write!(f, "seats must be between 1 and {max}"),
        }
    }
}

impl std::error::Error for BookingValidationError {}

/// A passenger's seat request on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub route_id: Uuid,
    #[schema(value_type = String)]
    pub passenger_id: UserId,
    pub seats: u8,
    pub pickup: Option<Place>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Validate the seat count and build a pending booking.
    pub fn request(
        id: Uuid,
        route_id: Uuid,
        passenger_id: UserId,
        seats: u8,
        pickup: Option<Place>,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingValidationError> {
        if !(1..=BOOKING_SEATS_MAX).contains(&seats) {
            return Err(BookingValidationError::SeatsOutOfRange {
                max: BOOKING_SEATS_MAX,
            });
        }
        Ok(Self {
            id,
            route_id,
            passenger_id,
            seats,
            pickup,
            status: BookingStatus::Pending,
            created_at: now,
        })
    }

    fn move_to(&mut self, to: BookingStatus) -> Result<(), BookingStateError> {
        let allowed = matches!(
            (self.status, to),
            (BookingStatus::Pending, BookingStatus::Accepted | BookingStatus::Rejected)
                | (
                    BookingStatus::Pending | BookingStatus::Accepted,
                    BookingStatus::Cancelled
                )
        );
        if !allowed {
            return Err(BookingStateError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// `pending -> accepted`.
    pub fn accept(&mut self) -> Result<(), BookingStateError> {
        self.move_to(BookingStatus::Accepted)
    }

    /// `pending -> rejected`.
    pub fn reject(&mut self) -> Result<(), BookingStateError> {
        self.move_to(BookingStatus::Rejected)
    }

    /// `pending | accepted -> cancelled`; returns the seats to release.
    pub fn cancel(&mut self) -> Result<u8, BookingStateError> {
        let held = if self.status == BookingStatus::Accepted {
            self.seats
        } else {
            0
        };
        self.move_to(BookingStatus::Cancelled)?;
        Ok(held)
    }
}
