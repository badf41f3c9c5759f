//! Geocoding and directions passthrough.
//!
//! Provider failures arrive here already mapped by the maps service:
//! no match is `not_found`, quota or outage is `service_unavailable`.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Coordinates, DirectionsPlan, DirectionsRequest, DirectionsStop, DirectionsValidationError,
    Error, GeocodeResult,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::routes::place_error;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, require};

#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeQuery {
    /// Free-text address.
    pub address: Option<String>,
}

/// A stop given either as an address or as a coordinate pair.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StopInput {
    Point { lat: f64, lng: f64 },
    Address(String),
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsBody {
    pub origin: Option<StopInput>,
    pub destination: Option<StopInput>,
    #[serde(default)]
    pub waypoints: Vec<StopInput>,
}

fn parse_stop(input: StopInput, field: &str) -> Result<DirectionsStop, Error> {
    match input {
        StopInput::Point { lat, lng } => Coordinates::new(lat, lng)
            .map(DirectionsStop::Coordinates)
            .map_err(|err| place_error(field, &err)),
        StopInput::Address(address) => Ok(DirectionsStop::Address(address)),
    }
}

fn directions_error(err: DirectionsValidationError) -> Error {
    match err {
        DirectionsValidationError::EmptyStop => field_error("origin", "empty_address", err),
        DirectionsValidationError::TooManyWaypoints { .. } => {
            field_error("waypoints", "too_many", err)
        }
    }
}

fn parse_directions(body: DirectionsBody) -> Result<DirectionsRequest, Error> {
    let origin = parse_stop(require(body.origin, FieldName::new("origin"))?, "origin")?;
    let destination = parse_stop(
        require(body.destination, FieldName::new("destination"))?,
        "destination",
    )?;
    let waypoints = body
        .waypoints
        .into_iter()
        .map(|stop| parse_stop(stop, "waypoints"))
        .collect::<Result<Vec<_>, _>>()?;
    DirectionsRequest::new(origin, destination, waypoints).map_err(directions_error)
}

/// Resolve an address to coordinates.
#[utoipa::path(
    get,
    path = "/api/v1/maps/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Best match", body = GeocodeResult),
        (status = 400, description = "Missing address", body = ErrorSchema),
        (status = 404, description = "No match", body = ErrorSchema),
        (status = 503, description = "Maps provider unavailable", body = ErrorSchema)
    ),
    tags = ["maps"],
    operation_id = "geocode"
)]
#[get("/maps/geocode")]
pub async fn geocode(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<GeocodeQuery>,
) -> ApiResult<web::Json<GeocodeResult>> {
    session.require_user_id()?;
    let address = require(query.into_inner().address, FieldName::new("address"))?;
    if address.trim().is_empty() {
        return Err(field_error("address", "empty_address", "address must not be empty"));
    }
    Ok(web::Json(state.maps.geocode(address.trim()).await?))
}

/// Driving directions through the given stops.
#[utoipa::path(
    post,
    path = "/api/v1/maps/directions",
    request_body = DirectionsBody,
    responses(
        (status = 200, description = "Driving plan", body = DirectionsPlan),
        (status = 400, description = "Invalid stops", body = ErrorSchema),
        (status = 404, description = "No route between the stops", body = ErrorSchema),
        (status = 503, description = "Maps provider unavailable", body = ErrorSchema)
    ),
    tags = ["maps"],
    operation_id = "directions"
)]
#[post("/maps/directions")]
pub async fn directions(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DirectionsBody>,
) -> ApiResult<web::Json<DirectionsPlan>> {
    session.require_user_id()?;
    let request = parse_directions(payload.into_inner())?;
    Ok(web::Json(state.maps.directions(&request).await?))
}
