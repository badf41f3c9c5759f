//! DTOs for decoding Google Geocoding and Directions responses.
//!
//! Both APIs wrap results in an envelope carrying a `status` string; the
//! adapter checks it before mapping the payload into domain records.

use serde::Deserialize;

use crate::domain::{Coordinates, DirectionsLeg, DirectionsPlan, GeocodeResult};

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResponseDto {
    pub(super) status: String,
    #[serde(default)]
    pub(super) error_message: Option<String>,
    #[serde(default)]
    pub(super) results: Vec<GeocodeResultDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResultDto {
    formatted_address: String,
    geometry: GeometryDto,
}

#[derive(Debug, Deserialize)]
struct GeometryDto {
    location: LatLngDto,
}

#[derive(Debug, Deserialize)]
struct LatLngDto {
    lat: f64,
    lng: f64,
}

impl GeocodeResponseDto {
    /// First (best) match.
    pub(super) fn into_best_match(self) -> Result<Option<GeocodeResult>, String> {
        let Some(first) = self.results.into_iter().next() else {
            return Ok(None);
        };
        let location = first.geometry.location;
        let coordinates =
            Coordinates::new(location.lat, location.lng).map_err(|err| err.to_string())?;
        Ok(Some(GeocodeResult {
            formatted_address: first.formatted_address,
            coordinates,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DirectionsResponseDto {
    pub(super) status: String,
    #[serde(default)]
    pub(super) error_message: Option<String>,
    #[serde(default)]
    pub(super) routes: Vec<DirectionsRouteDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DirectionsRouteDto {
    overview_polyline: PolylineDto,
    #[serde(default)]
    legs: Vec<LegDto>,
}

#[derive(Debug, Deserialize)]
struct PolylineDto {
    points: String,
}

#[derive(Debug, Deserialize)]
struct LegDto {
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    distance: ValueDto,
    duration: ValueDto,
}

#[derive(Debug, Deserialize)]
struct ValueDto {
    value: u64,
}

impl DirectionsResponseDto {
    /// First route returned; Google orders alternatives by preference.
    pub(super) fn into_plan(self) -> Option<DirectionsPlan> {
        let route = self.routes.into_iter().next()?;
        let legs = route
            .legs
            .into_iter()
            .map(|leg| DirectionsLeg {
                start_address: leg.start_address,
                end_address: leg.end_address,
                distance_meters: leg.distance.value,
                duration_seconds: leg.duration.value,
            })
            .collect();
        Some(DirectionsPlan::from_legs(
            route.overview_polyline.points,
            legs,
        ))
    }
}
