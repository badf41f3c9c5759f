//! Route search: filtering, sorting and pagination over published routes.
//!
//! Text filters compare normalised addresses by substring, so "market st"
//! matches "1 Market St., San Francisco". The `date` filter matches the UTC
//! calendar day of departure.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::place::{Coordinates, haversine_km, normalize_address};
use super::route::{CarpoolRoute, RouteStatus};

/// Default number of routes per page.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;
/// Largest accepted search radius.
pub const MAX_RADIUS_KM: f64 = 500.0;

/// Errors raised while validating a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteSearchError {
    LimitOutOfRange { max: u32 },
    RadiusOutOfRange { max: f64 },
    DistanceSortWithoutLocation,
    UnknownSort(String),
}

impl fmt::Display for RouteSearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitOutOfRange { max } => write!(f, "limit must be between 1 and {max}"),
            Self::RadiusOutOfRange { max } => {
                write!(f, "radiusKm must be greater than 0 and at most {max}")
            }
            Self::DistanceSortWithoutLocation => {
                write!(f, "sorting by distance requires lat and lng")
            }
            Self::UnknownSort(raw) => write!(
                f,
                "unknown sort '{raw}'; expected departure, price, seats, or distance"
            ),
        }
    }
}

impl std::error::Error for RouteSearchError {}

impl RouteSearchError {
    /// Query parameter the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::LimitOutOfRange { .. } => "limit",
            Self::RadiusOutOfRange { .. } => "radiusKm",
            Self::DistanceSortWithoutLocation | Self::UnknownSort(_) => "sort",
        }
    }
}

/// Centre point and radius for proximity search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearFilter {
    center: Coordinates,
    radius_km: f64,
}

impl NearFilter {
    /// Validate the radius.
    pub fn new(center: Coordinates, radius_km: f64) -> Result<Self, RouteSearchError> {
        if !radius_km.is_finite() || radius_km <= 0.0 || radius_km > MAX_RADIUS_KM {
            return Err(RouteSearchError::RadiusOutOfRange { max: MAX_RADIUS_KM });
        }
        Ok(Self { center, radius_km })
    }

    /// Centre of the search area.
    pub fn center(&self) -> Coordinates {
        self.center
    }

    /// Search radius in kilometres.
    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    fn distance_to(&self, route: &CarpoolRoute) -> Option<f64> {
        route
            .origin
            .coordinates
            .map(|origin| haversine_km(self.center, origin))
    }
}

/// Search criteria. Empty filters match every bookable route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteFilter {
    origin: Option<String>,
    destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub min_seats: Option<u8>,
    pub max_price_cents: Option<i64>,
    pub near: Option<NearFilter>,
    /// Include departed and finished (but never cancelled) routes.
    pub include_past: bool,
}

impl RouteFilter {
    /// Filter origins containing this text once normalised.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(normalize_address(origin)).filter(|text| !text.is_empty());
        self
    }

    /// Filter destinations containing this text once normalised.
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(normalize_address(destination)).filter(|text| !text.is_empty());
        self
    }

    fn matches(&self, route: &CarpoolRoute, now: DateTime<Utc>) -> bool {
        if self.include_past {
            if route.status == RouteStatus::Cancelled {
                return false;
            }
        } else if route.status != RouteStatus::Scheduled || route.departure_at <= now {
            return false;
        }

        let needed_seats = self.min_seats.unwrap_or(if self.include_past { 0 } else { 1 });
        if route.seats_available < needed_seats {
            return false;
        }
        let text_matches = |needle: &Option<String>, haystack: &str| {
            needle
                .as_deref()
                .is_none_or(|needle| haystack.contains(needle))
        };
        if !text_matches(&self.origin, &route.origin.normalized)
            || !text_matches(&self.destination, &route.destination.normalized)
        {
            return false;
        }
        if self
            .date
            .is_some_and(|date| route.departure_at.date_naive() != date)
        {
            return false;
        }
        if self
            .max_price_cents
            .is_some_and(|max| route.price_per_seat_cents > max)
        {
            return false;
        }
        match &self.near {
            Some(near) => near
                .distance_to(route)
                .is_some_and(|km| km <= near.radius_km),
            None => true,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RouteSort {
    /// Earliest departure first.
    #[default]
    Departure,
    /// Cheapest first, ties by departure.
    Price,
    /// Most free seats first.
    Seats,
    /// Closest origin to the `near` centre first.
    Distance,
}

impl FromStr for RouteSort {
    type Err = RouteSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "departure" => Ok(Self::Departure),
            "price" => Ok(Self::Price),
            "seats" => Ok(Self::Seats),
            "distance" => Ok(Self::Distance),
            other => Err(RouteSearchError::UnknownSort(other.to_owned())),
        }
    }
}

/// Page window over search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: u32,
    offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Validate the window; `limit` defaults to [`DEFAULT_LIMIT`].
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Result<Self, RouteSearchError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(RouteSearchError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(Self {
            limit,
            offset: offset.unwrap_or(0),
        })
    }

    /// Maximum number of items returned.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items skipped.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Slice `items` down to this window.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// A page of routes plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutePage {
    pub routes: Vec<CarpoolRoute>,
    pub total: usize,
    pub limit: u32,
    pub offset: u32,
}

/// Filter and order `routes`.
///
/// Sorting by distance requires a `near` filter.
pub fn search(
    routes: Vec<CarpoolRoute>,
    filter: &RouteFilter,
    sort: RouteSort,
    now: DateTime<Utc>,
) -> Result<Vec<CarpoolRoute>, RouteSearchError> {
    if sort == RouteSort::Distance && filter.near.is_none() {
        return Err(RouteSearchError::DistanceSortWithoutLocation);
    }
    let mut matched: Vec<CarpoolRoute> = routes
        .into_iter()
        .filter(|route| filter.matches(route, now))
        .collect();

    match sort {
        RouteSort::Departure => matched.sort_by_key(|route| route.departure_at),
        RouteSort::Price => matched.sort_by(|a, b| {
            a.price_per_seat_cents
                .cmp(&b.price_per_seat_cents)
                .then(a.departure_at.cmp(&b.departure_at))
        }),
        RouteSort::Seats => matched.sort_by(|a, b| {
            b.seats_available
                .cmp(&a.seats_available)
                .then(a.departure_at.cmp(&b.departure_at))
        }),
        RouteSort::Distance => {
            if let Some(near) = &filter.near {
                matched.sort_by(|a, b| {
                    let da = near.distance_to(a).unwrap_or(f64::MAX);
                    let db = near.distance_to(b).unwrap_or(f64::MAX);
                    da.partial_cmp(&db).unwrap_or(Ordering::Equal)
                });
            }
        }
    }
    Ok(matched)
}

#[cfg(test)]
#[path = "route_search_tests.rs"]
mod tests;
