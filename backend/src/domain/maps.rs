//! Geocoding and directions data shared by the maps port and route planning.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::booking::{Booking, BookingStatus};
use super::place::{Coordinates, Place};
use super::route::CarpoolRoute;

/// Largest number of intermediate stops a directions request may carry.
pub const DIRECTIONS_WAYPOINTS_MAX: usize = 23;

/// A geocoded address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub coordinates: Coordinates,
}

/// A directions stop: free-text address or a coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DirectionsStop {
    Coordinates(Coordinates),
    Address(String),
}

impl DirectionsStop {
    /// Prefer coordinates when the place is geocoded.
    pub fn from_place(place: &Place) -> Self {
        match place.coordinates {
            Some(coordinates) => Self::Coordinates(coordinates),
            None => Self::Address(place.address.clone()),
        }
    }

    /// Wire form used by the directions API (`lat,lng` or the address).
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Coordinates(c) => format!("{},{}", c.lat(), c.lng()),
            Self::Address(address) => address.clone(),
        }
    }
}

/// Errors raised while building a directions request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectionsValidationError {
    EmptyStop,
    TooManyWaypoints { max: usize },
}

impl fmt::Display for DirectionsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStop => write!(f, "directions stops must not be empty"),
            Self::TooManyWaypoints { max } => {
                write!(f, "directions support at most {max} waypoints")
            }
        }
    }
}

impl std::error::Error for DirectionsValidationError {}

/// Ordered stops for a directions lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    origin: DirectionsStop,
    destination: DirectionsStop,
    waypoints: Vec<DirectionsStop>,
}

impl DirectionsRequest {
    /// Validate stop count and that address stops are non-blank.
    pub fn new(
        origin: DirectionsStop,
        destination: DirectionsStop,
        waypoints: Vec<DirectionsStop>,
    ) -> Result<Self, DirectionsValidationError> {
        if waypoints.len() > DIRECTIONS_WAYPOINTS_MAX {
            return Err(DirectionsValidationError::TooManyWaypoints {
                max: DIRECTIONS_WAYPOINTS_MAX,
            });
        }
        let blank = |stop: &DirectionsStop| {
            matches!(stop, DirectionsStop::Address(address) if address.trim().is_empty())
        };
        if blank(&origin) || blank(&destination) || waypoints.iter().any(blank) {
            return Err(DirectionsValidationError::EmptyStop);
        }
        Ok(Self {
            origin,
            destination,
            waypoints,
        })
    }

    /// Starting stop.
    pub fn origin(&self) -> &DirectionsStop {
        &self.origin
    }

    /// Final stop.
    pub fn destination(&self) -> &DirectionsStop {
        &self.destination
    }

    /// Intermediate stops in visiting order.
    pub fn waypoints(&self) -> &[DirectionsStop] {
        &self.waypoints
    }
}

/// One leg between consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsLeg {
    pub start_address: String,
    pub end_address: String,
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

/// A resolved driving plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsPlan {
    pub distance_meters: u64,
    pub duration_seconds: u64,
    /// Encoded overview polyline.
    pub polyline: String,
    pub legs: Vec<DirectionsLeg>,
}

impl DirectionsPlan {
    /// Build a plan whose totals are the sum of its legs.
    pub fn from_legs(polyline: String, legs: Vec<DirectionsLeg>) -> Self {
        Self {
            distance_meters: legs.iter().map(|leg| leg.distance_meters).sum(),
            duration_seconds: legs.iter().map(|leg| leg.duration_seconds).sum(),
            polyline,
            legs,
        }
    }
}

/// Stops for driving a route: origin, its waypoints, the pickups of accepted
/// bookings in creation order, then the destination.
pub fn route_directions_request(
    route: &CarpoolRoute,
    bookings: &[Booking],
) -> Result<DirectionsRequest, DirectionsValidationError> {
    let mut accepted: Vec<&Booking> = bookings
        .iter()
        .filter(|booking| booking.route_id == route.id && booking.status == BookingStatus::Accepted)
        .collect();
    accepted.sort_by_key(|booking| booking.created_at);

    let waypoints = route
        .waypoints
        .iter()
        .chain(accepted.iter().filter_map(|booking| booking.pickup.as_ref()))
        .map(DirectionsStop::from_place)
        .collect();

    DirectionsRequest::new(
        DirectionsStop::from_place(&route.origin),
        DirectionsStop::from_place(&route.destination),
        waypoints,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rstest::rstest;

    use super::*;
    use crate::domain::fixtures;
    use crate::domain::{UserId, UserRole};

    #[rstest]
    fn route_stops_follow_waypoints_then_accepted_pickups() {
        let driver = fixtures::user(UserRole::Driver, "d@example.com").id;
        let vehicle = fixtures::vehicle(&driver, 4);
        let mut route = fixtures::route(&driver, &vehicle, 4);
        route.waypoints = vec![fixtures::place("Waypoint A")];

        let mut late = fixtures::booking(&route, &UserId::random(), 1);
        late.status = BookingStatus::Accepted;
        late.pickup = Some(fixtures::place("Late Pickup"));
        late.created_at = fixtures::now() + Duration::minutes(5);

        let mut early = fixtures::booking(&route, &UserId::random(), 1);
        early.status = BookingStatus::Accepted;
        early.pickup = Some(
            Place::new(
                "Early Pickup",
                Some(Coordinates::new(37.5, -122.2).expect("coords")),
            )
            .expect("place"),
        );

        let mut pending = fixtures::booking(&route, &UserId::random(), 1);
        pending.pickup = Some(fixtures::place("Pending Pickup"));

        let request =
            route_directions_request(&route, &[late, pending, early]).expect("valid request");

        let stops: Vec<String> = request
            .waypoints()
            .iter()
            .map(DirectionsStop::to_query_value)
            .collect();
        assert_eq!(stops, vec!["Waypoint A", "37.5,-122.2", "Late Pickup"]);
        assert_eq!(
            request.origin(),
            &DirectionsStop::Address(route.origin.address.clone())
        );
    }

    #[rstest]
    fn rejects_too_many_waypoints() {
        let stops = vec![DirectionsStop::Address("x".into()); DIRECTIONS_WAYPOINTS_MAX + 1];
        let err = DirectionsRequest::new(
            DirectionsStop::Address("a".into()),
            DirectionsStop::Address("b".into()),
            stops,
        )
        .expect_err("too many");
        assert_eq!(
            err,
            DirectionsValidationError::TooManyWaypoints {
                max: DIRECTIONS_WAYPOINTS_MAX
            }
        );
    }

    #[rstest]
    fn rejects_blank_addresses() {
        let err = DirectionsRequest::new(
            DirectionsStop::Address(" ".into()),
            DirectionsStop::Address("b".into()),
            Vec::new(),
        )
        .expect_err("blank");
        assert_eq!(err, DirectionsValidationError::EmptyStop);
    }

    #[rstest]
    fn stop_deserialises_either_shape() {
        let stops: Vec<DirectionsStop> =
            serde_json::from_str(r#"[{"lat": 1.0, "lng": 2.0}, "Main St"]"#).expect("parse");
        assert!(matches!(stops.first(), Some(DirectionsStop::Coordinates(_))));
        assert_eq!(stops.get(1), Some(&DirectionsStop::Address("Main St".into())));
    }

    #[rstest]
    fn plan_totals_sum_legs() {
        let leg = |d, t| DirectionsLeg {
            start_address: "a".into(),
            end_address: "b".into(),
            distance_meters: d,
            duration_seconds: t,
        };
        let plan = DirectionsPlan::from_legs("abc".into(), vec![leg(100, 10), leg(250, 30)]);
        assert_eq!((plan.distance_meters, plan.duration_seconds), (350, 40));
    }
}
