//! Places, coordinates and address normalisation.
//!
//! Address matching throughout route search compares the normalised form
//! produced by [`normalize_address`], never the raw text.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum accepted address length.
pub const ADDRESS_MAX: usize = 255;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Validation errors for places and coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceValidationError {
    EmptyAddress,
    AddressTooLong { max: usize },
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl fmt::Display for PlaceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "address must not be empty"),
            Self::AddressTooLong { max } => write!(f, "address must be at most {max} characters"),
            Self::LatitudeOutOfRange(lat) => {
                write!(f, "latitude {lat} must be a finite value between -90 and 90")
            }
            Self::LongitudeOutOfRange(lng) => {
                write!(f, "longitude {lng} must be a finite value between -180 and 180")
            }
        }
    }
}

impl std::error::Error for PlaceValidationError {}

/// WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "CoordinatesDto", into = "CoordinatesDto")]
pub struct Coordinates {
    #[schema(example = 37.7946)]
    lat: f64,
    #[schema(example = -122.395)]
    lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CoordinatesDto {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Validate latitude and longitude ranges.
    ///
    /// ```
    /// use backend::domain::Coordinates;
    ///
    /// assert!(Coordinates::new(37.79, -122.39).is_ok());
    /// assert!(Coordinates::new(91.0, 0.0).is_err());
    /// assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    /// ```
    pub fn new(lat: f64, lng: f64) -> Result<Self, PlaceValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(PlaceValidationError::LatitudeOutOfRange(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(PlaceValidationError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl From<Coordinates> for CoordinatesDto {
    fn from(value: Coordinates) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

impl TryFrom<CoordinatesDto> for Coordinates {
    type Error = PlaceValidationError;

    fn try_from(value: CoordinatesDto) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lng)
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Lower-case an address, drop punctuation and collapse whitespace.
///
/// Letters, digits, spaces and `#` survive.
///
/// ```
/// use backend::domain::normalize_address;
///
/// assert_eq!(normalize_address("  1 Market St., San Francisco!  "), "1 market st san francisco");
/// assert_eq!(normalize_address("Apt #4, Main-Street"), "apt #4 mainstreet");
/// ```
pub fn normalize_address(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '#')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A named location, optionally geocoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[schema(example = "1 Market St, San Francisco, CA")]
    pub address: String,
    #[schema(example = "1 market st san francisco ca")]
    pub normalized: String,
    pub coordinates: Option<Coordinates>,
}

impl Place {
    /// Validate an address and compute its normalised form.
    pub fn new(
        address: impl AsRef<str>,
        coordinates: Option<Coordinates>,
    ) -> Result<Self, PlaceValidationError> {
        let address = address.as_ref().trim();
        if address.is_empty() {
            return Err(PlaceValidationError::EmptyAddress);
        }
        if address.chars().count() > ADDRESS_MAX {
            return Err(PlaceValidationError::AddressTooLong { max: ADDRESS_MAX });
        }
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return Err(PlaceValidationError::EmptyAddress);
        }
        Ok(Self {
            address: address.to_owned(),
            normalized,
            coordinates,
        })
    }

    /// True when both places normalise to the same address.
    pub fn same_address(&self, other: &Place) -> bool {
        self.normalized == other.normalized
    }
}
