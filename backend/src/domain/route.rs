//! Carpool routes published by drivers, their lifecycle and seat accounting.
//!
//! ## Invariants
//! - `seats_available <= seats_total <= vehicle.seats`.
//! - `price_per_seat_cents >= 0`.
//! - Origin and destination differ once normalised.
//! - Status only moves `scheduled -> in_progress -> completed`, or to
//!   `cancelled` from `scheduled` and `in_progress`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::place::Place;
use super::user::UserId;
use super::vehicle::Vehicle;

/// Maximum number of intermediate waypoints on a route.
pub const WAYPOINTS_MAX: usize = 8;
/// Maximum length of driver notes.
pub const NOTES_MAX: usize = 500;

/// Lifecycle state of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// True once no further transitions are possible.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Compute the status reached by `transition`.
    ///
    /// ```
    /// use backend::domain::{RouteStatus, RouteTransition};
    ///
    /// assert_eq!(
    ///     RouteStatus::Scheduled.apply(RouteTransition::Start),
    ///     Ok(RouteStatus::InProgress)
    /// );
    /// assert!(RouteStatus::Completed.apply(RouteTransition::Cancel).is_err());
    /// ```
    pub fn apply(self, transition: RouteTransition) -> Result<Self, RouteStateError> {
        match (self, transition) {
            (Self::Scheduled, RouteTransition::Start) => Ok(Self::InProgress),
            (Self::InProgress, RouteTransition::Complete) => Ok(Self::Completed),
            (Self::Scheduled | Self::InProgress, RouteTransition::Cancel) => Ok(Self::Cancelled),
            (from, transition) => Err(RouteStateError::InvalidTransition { from, transition }),
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteStatus {
    type Err = RouteStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(RouteStateError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Driver-initiated lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteTransition {
    Start,
    Complete,
    Cancel,
}

impl fmt::Display for RouteTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        })
    }
}

/// Errors raised when route state forbids an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteStateError {
    #[error("cannot {transition} a route that is {from}")]
    InvalidTransition {
        from: RouteStatus,
        transition: RouteTransition,
    },
    #[error("route is {status}; only scheduled routes can be changed")]
    NotScheduled { status: RouteStatus },
    #[error("requested {requested} seats but only {available} are available")]
    InsufficientSeats { requested: u8, available: u8 },
    #[error("unknown route status: {0}")]
    UnknownStatus(String),
}

/// Validation errors for route input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteValidationError {
    TooManyWaypoints { max: usize },
    SameOriginAndDestination,
    DepartureInPast,
    SeatsOutOfRange { max: u8 },
    NegativePrice,
    NotesTooLong { max: usize },
    VehicleNotOwned,
}

impl fmt::Display for RouteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyWaypoints { max } => write!(f, "at most {max} waypoints are allowed"),
            Self::SameOriginAndDestination => {
                write!(f, "origin and destination must be different")
            }
            Self::DepartureInPast => write!(f, "departure time must be in the future"),
            Self::SeatsOutOfRange { max } => {
                write!(f, "seats must be between 1 and the vehicle's {max} seats")
            }
            Self::NegativePrice => write!(f, "price per seat must not be negative"),
            Self::NotesTooLong { max } => write!(f, "notes must be at most {max} characters"),
            Self::VehicleNotOwned => write!(f, "vehicle does not belong to the driver"),
        }
    }
}

impl std::error::Error for RouteValidationError {}

impl RouteValidationError {
    /// JSON field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::TooManyWaypoints { .. } => "waypoints",
            Self::SameOriginAndDestination => "destination",
            Self::DepartureInPast => "departureAt",
            Self::SeatsOutOfRange { .. } => "seats",
            Self::NegativePrice => "pricePerSeatCents",
            Self::NotesTooLong { .. } => "notes",
            Self::VehicleNotOwned => "vehicleId",
        }
    }
}

/// A published carpool route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarpoolRoute {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub driver_id: UserId,
    pub vehicle_id: Uuid,
    pub origin: Place,
    pub destination: Place,
    pub waypoints: Vec<Place>,
    pub departure_at: DateTime<Utc>,
    pub seats_total: u8,
    pub seats_available: u8,
    pub price_per_seat_cents: i64,
    pub status: RouteStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CarpoolRoute {
    /// Take `seats` from the free pool.
    pub fn reserve_seats(&mut self, seats: u8) -> Result<(), RouteStateError> {
        if seats > self.seats_available {
            return Err(RouteStateError::InsufficientSeats {
                requested: seats,
                available: self.seats_available,
            });
        }
        self.seats_available -= seats;
        Ok(())
    }

    /// Return `seats` to the free pool, never exceeding the total.
    pub fn release_seats(&mut self, seats: u8) {
        self.seats_available = self
            .seats_available
            .saturating_add(seats)
            .min(self.seats_total);
    }

    /// Apply a lifecycle transition.
    pub fn transition(&mut self, transition: RouteTransition) -> Result<(), RouteStateError> {
        self.status = self.status.apply(transition)?;
        Ok(())
    }

    /// Fail unless the route is still scheduled.
    pub fn ensure_scheduled(&self) -> Result<(), RouteStateError> {
        if self.status == RouteStatus::Scheduled {
            Ok(())
        } else {
            Err(RouteStateError::NotScheduled {
                status: self.status,
            })
        }
    }

    /// Apply a validated update; only scheduled routes may change.
    pub fn apply(&mut self, update: RouteUpdate) -> Result<(), RouteStateError> {
        self.ensure_scheduled()?;
        let RouteUpdate {
            departure_at,
            price_per_seat_cents,
            notes,
            waypoints,
        } = update;
        if let Some(departure_at) = departure_at {
            self.departure_at = departure_at;
        }
        if let Some(price) = price_per_seat_cents {
            self.price_per_seat_cents = price;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }
        if let Some(waypoints) = waypoints {
            self.waypoints = waypoints;
        }
        Ok(())
    }
}

fn validate_notes(notes: Option<&str>) -> Result<Option<String>, RouteValidationError> {
    match notes.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) if text.chars().count() > NOTES_MAX => {
            Err(RouteValidationError::NotesTooLong { max: NOTES_MAX })
        }
        other => Ok(other.map(str::to_owned)),
    }
}

fn validate_waypoints(waypoints: Vec<Place>) -> Result<Vec<Place>, RouteValidationError> {
    if waypoints.len() > WAYPOINTS_MAX {
        return Err(RouteValidationError::TooManyWaypoints { max: WAYPOINTS_MAX });
    }
    Ok(waypoints)
}

fn validate_departure(
    departure_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, RouteValidationError> {
    if departure_at <= now {
        return Err(RouteValidationError::DepartureInPast);
    }
    Ok(departure_at)
}

fn validate_price(price: i64) -> Result<i64, RouteValidationError> {
    if price < 0 {
        return Err(RouteValidationError::NegativePrice);
    }
    Ok(price)
}

/// Input for publishing a route, before validation against the vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDraft {
    pub vehicle_id: Uuid,
    pub origin: Place,
    pub destination: Place,
    pub waypoints: Vec<Place>,
    pub departure_at: DateTime<Utc>,
    pub seats: u8,
    pub price_per_seat_cents: i64,
    pub notes: Option<String>,
}

impl RouteDraft {
    /// Validate the draft against the chosen vehicle and build the route.
    pub fn into_route(
        self,
        id: Uuid,
        driver_id: UserId,
        vehicle: &Vehicle,
        now: DateTime<Utc>,
    ) -> Result<CarpoolRoute, RouteValidationError> {
        if vehicle.owner_id != driver_id || vehicle.id != self.vehicle_id {
            return Err(RouteValidationError::VehicleNotOwned);
        }
        if self.origin.same_address(&self.destination) {
            return Err(RouteValidationError::SameOriginAndDestination);
        }
        if self.seats == 0 || self.seats > vehicle.seats {
            return Err(RouteValidationError::SeatsOutOfRange { max: vehicle.seats });
        }
        Ok(CarpoolRoute {
            id,
            driver_id,
            vehicle_id: self.vehicle_id,
            origin: self.origin,
            destination: self.destination,
            waypoints: validate_waypoints(self.waypoints)?,
            departure_at: validate_departure(self.departure_at, now)?,
            seats_total: self.seats,
            seats_available: self.seats,
            price_per_seat_cents: validate_price(self.price_per_seat_cents)?,
            status: RouteStatus::Scheduled,
            notes: validate_notes(self.notes.as_deref())?,
            created_at: now,
        })
    }
}

/// Partial route update.
///
/// `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteUpdate {
    pub departure_at: Option<DateTime<Utc>>,
    pub price_per_seat_cents: Option<i64>,
    pub notes: Option<Option<String>>,
    pub waypoints: Option<Vec<Place>>,
}

impl RouteUpdate {
    /// Validate the supplied fields.
    pub fn try_new(
        departure_at: Option<DateTime<Utc>>,
        price_per_seat_cents: Option<i64>,
        notes: Option<&str>,
        waypoints: Option<Vec<Place>>,
        now: DateTime<Utc>,
    ) -> Result<Self, RouteValidationError> {
        Ok(Self {
            departure_at: departure_at
                .map(|at| validate_departure(at, now))
                .transpose()?,
            price_per_seat_cents: price_per_seat_cents.map(validate_price).transpose()?,
            notes: notes.map(|text| validate_notes(Some(text))).transpose()?,
            waypoints: waypoints.map(validate_waypoints).transpose()?,
        })
    }
}

#[cfg(test)]
#[path = "route_tests.rs"]
mod tests;
